//! Integration tests for `sftcheck run <feature>`
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

mod utils;

use predicates::prelude::*;
use serde_json::json;
use std::fs;
use utils::*;

fn sftcheck(sim: &SimDir) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("sftcheck");
    cmd.current_dir(sim.path());
    cmd
}

fn incubation_dir(mean: f64, samples: &[f64]) -> SimDir {
    let sim = SimDir::new();
    sim.config(json!({
        "Config_Name": "exponential incubation",
        "Simulation_Duration": 60,
        "Incubation_Period_Distribution": "EXPONENTIAL_DISTRIBUTION",
        "Incubation_Period_Exponential": mean
    }));
    sim.write(
        "test.txt",
        &timer_log("Incubation_timer calculated as", samples, true),
    );
    sim
}

#[test]
fn test_incubation_period_success_report() {
    let sim = incubation_dir(5.0, &exponential_samples(5.0, 400, 11));

    sftcheck(&sim)
        .args(["run", "incubation-period"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SUMMARY: Success=True"));

    let report = sim.report();
    assert!(report.starts_with("Beginning validation for exponential incubation at time"));
    assert!(report.contains("KS D="));
    assert!(report.trim_end().ends_with("SUMMARY: Success=True"));
}

#[test]
fn test_strict_preset_fails_wrong_mean() {
    // samples drawn with mean 15 against a configured mean of 5
    let sim = incubation_dir(5.0, &exponential_samples(15.0, 400, 3));

    sftcheck(&sim)
        .args(["run", "incubation-period", "--preset", "strict"])
        .assert()
        .success();

    let report = sim.report();
    assert!(report.contains("BAD:"));
    assert!(report.contains("SUMMARY: Success=False"));
}

#[test]
fn test_default_preset_downgrades_single_rejection() {
    let sim = incubation_dir(5.0, &exponential_samples(15.0, 400, 3));

    sftcheck(&sim)
        .args(["run", "incubation-period"])
        .assert()
        .success();

    let report = sim.report();
    assert!(report.contains("WARNING:"));
    assert!(report.contains("SUMMARY: Success=True"));
}

#[test]
fn test_debug_writes_dump_and_plot_writes_svg() {
    let sim = incubation_dir(5.0, &exponential_samples(5.0, 200, 5));

    sftcheck(&sim)
        .args(["--debug", "run", "incubation-period", "--plot"])
        .assert()
        .success();

    let dump = fs::read_to_string(sim.path().join("DEBUG_incubation-period.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&dump).unwrap();
    assert_eq!(parsed["feature"], "incubation-period");
    assert_eq!(parsed["values"]["values"].as_array().unwrap().len(), 200);
    assert!(parsed["values"]["ks"].is_object());
    assert!(sim.path().join("incubation-period_cdf.svg").exists());
}

#[test]
fn test_missing_config_fails_without_report() {
    let sim = SimDir::new();
    sim.write("test.txt", "Done\n");

    sftcheck(&sim)
        .args(["run", "incubation-period"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config.json"));

    assert!(!sim.report_exists());
}

#[test]
fn test_custom_report_name() {
    let sim = incubation_dir(5.0, &exponential_samples(5.0, 100, 8));

    sftcheck(&sim)
        .args(["run", "incubation-period", "-r", "reports/incubation.txt"])
        .assert()
        .success();

    let report = fs::read_to_string(sim.path().join("reports/incubation.txt")).unwrap();
    assert!(report.contains("SUMMARY: Success="));
}

#[test]
fn test_wait_timeout_reads_aborted_run() {
    let sim = SimDir::new();
    sim.config(json!({
        "Simulation_Duration": 60,
        "Incubation_Period_Distribution": "CONSTANT_DISTRIBUTION",
        "Incubation_Period_Constant": 4
    }));
    let log = "Update(): Time: 1.0\n\
               Incubation_timer calculated as 4\n\
               Update(): Time: 2.0\n\
               Incubation_timer calculated as 4\n\
               Exiting\n";
    sim.write("test.txt", log);

    sftcheck(&sim)
        .args(["run", "incubation-period", "--wait-timeout", "5"])
        .assert()
        .success();

    let report = sim.report();
    assert!(report.contains("Simulation stopped early; analysing up to time 2"));
    assert!(report.contains("SUMMARY: Success=True"));
}

#[test]
fn test_import_pressure_run() {
    let sim = SimDir::new();
    sim.config(json!({"Config_Name": "imports", "Simulation_Duration": 50, "Base_Infectivity": 0}));
    sim.campaign(json!([{
        "Start_Day": 0,
        "Event_Coordinator_Config": {
            "Intervention_Config": {
                "class": "ImportPressure",
                "Durations": [50],
                "Daily_Import_Pressures": [6.0]
            }
        }
    }]));
    let counts = poisson_counts(6.0, 50, 21);
    sim.inset_chart(json!({"New Infections": {"Units": "", "Data": counts}}), 50);

    sftcheck(&sim)
        .args(["run", "import-pressure"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SUMMARY: Success=True"));

    assert!(sim.report().contains("Total imported infections"));
}

#[test]
fn test_demographic_coverage_run() {
    let sim = SimDir::new();
    sim.config(json!({"Config_Name": "coverage", "Simulation_Duration": 10}));
    sim.campaign(json!([{
        "Start_Day": 2,
        "Event_Coordinator_Config": {
            "Demographic_Coverage": 0.25,
            "Intervention_Config": {"class": "BroadcastEvent", "Broadcast_Event": "Vaccinated"}
        }
    }]));
    sim.inset_chart(
        json!({"Statistical Population": {"Units": "", "Data": vec![2000.0; 10]}}),
        10,
    );
    let mut csv = String::from("Time,Node_ID,Event_Name,Individual_ID\n");
    for id in 0..498 {
        csv.push_str(&format!("2,1,Vaccinated,{}\n", id));
    }
    sim.write_output("ReportEventRecorder.csv", &csv);

    sftcheck(&sim)
        .args(["run", "demographic-coverage"])
        .assert()
        .success();

    assert!(sim.report().contains("SUMMARY: Success=True"));
}

#[test]
fn test_event_consistency_run() {
    let sim = SimDir::new();
    sim.config(json!({"Config_Name": "events", "Simulation_Duration": 4}));
    sim.inset_chart(
        json!({"New Infections": {"Units": "", "Data": [0, 2, 0, 1]}}),
        4,
    );
    write_event_db(
        &sim.output("simulation_events.db"),
        &[
            (1.0, 10, "NewInfection"),
            (1.0, 11, "NewInfection"),
            (2.0, 10, "Recovered"),
            (3.0, 12, "NewInfection"),
        ],
    );
    sim.write_output(
        "PropertyReport.json",
        &json!({
            "Header": {"Timesteps": 4},
            "Channels": {
                "New Infections:Risk:HIGH": {"Units": "", "Data": [0, 1, 0, 1]},
                "New Infections:Risk:LOW": {"Units": "", "Data": [0, 1, 0, 0]}
            }
        })
        .to_string(),
    );

    sftcheck(&sim)
        .args(["run", "event-consistency"])
        .assert()
        .success();

    let report = sim.report();
    assert!(report.contains("Property report splits New Infections into 2 groups"));
    assert!(report.contains("SUMMARY: Success=True"), "{}", report);
}

#[test]
fn test_event_consistency_buckets_mid_step_events_by_floor() {
    let sim = SimDir::new();
    sim.config(json!({"Simulation_Duration": 4}));
    sim.inset_chart(
        json!({"New Infections": {"Units": "", "Data": [0, 2, 1, 0]}}),
        4,
    );
    // 1.5 and 1.9 belong to step 1, 2.5 to step 2
    write_event_db(
        &sim.output("simulation_events.db"),
        &[
            (1.5, 10, "NewInfection"),
            (1.9, 11, "NewInfection"),
            (2.5, 12, "NewInfection"),
        ],
    );

    sftcheck(&sim)
        .args(["run", "event-consistency"])
        .assert()
        .success();

    let report = sim.report();
    assert!(!report.contains("BAD:"), "{}", report);
    assert!(report.contains("SUMMARY: Success=True"));
}

#[test]
fn test_event_consistency_mismatch() {
    let sim = SimDir::new();
    sim.config(json!({"Simulation_Duration": 4}));
    sim.inset_chart(
        json!({"New Infections": {"Units": "", "Data": [0, 3, 0, 1]}}),
        4,
    );
    write_event_db(
        &sim.output("simulation_events.db"),
        &[(1.0, 10, "NewInfection"), (3.0, 12, "NewInfection")],
    );

    sftcheck(&sim)
        .args(["run", "event-consistency"])
        .assert()
        .success();

    let report = sim.report();
    assert!(report.contains("WARNING:"));
    assert!(report.contains("SUMMARY: Success=False"));
}

#[test]
fn test_unknown_feature_is_usage_error() {
    let sim = SimDir::new();
    sftcheck(&sim)
        .args(["run", "no-such-feature"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#![no_main]

use libfuzzer_sys::fuzz_target;
use sftcheck::output::StdoutLog;

fuzz_target!(|data: &[u8]| {
    // Simulator logs are read lossily; parsing must never panic
    let text = String::from_utf8_lossy(data);
    let log = StdoutLog::parse_str(&text);
    let _ = log.last_time();
    let _ = log.finished();
    let _ = log.per_timestep();
    for key in ["Incubation_timer calculated as", "Time:", "=", ""] {
        let _ = log.values_after(key);
    }
});

use anyhow::Result;
use clap::Parser;
use sftcheck::cli::{Cli, Command, RunArgs};
use sftcheck::features;
use sftcheck::json_tree;
use sftcheck::output::{wait_for_done, WaitOptions};
use sftcheck::report::format_success_msg;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Run one feature test and print where the report went
fn run_feature(args: RunArgs, debug: bool) -> Result<()> {
    let mut ctx = args.to_context(debug)?;

    if let Some(secs) = args.wait_timeout {
        let status = wait_for_done(&ctx.inputs.stdout, WaitOptions::with_timeout_secs(secs))?;
        // an explicit --abort-timestep wins over what the log says
        if ctx.abort_timestep.is_none() {
            ctx.abort_timestep = status.aborted_at;
        }
    }

    let success = features::run_feature(args.feature, &ctx)?;
    println!(
        "{}: {} ({})",
        ctx.report_path.display(),
        format_success_msg(success),
        features::by_kind(args.feature).name()
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    match args.command {
        Command::Run(run_args) => run_feature(run_args, args.debug)?,
        Command::RenameEvents { campaign, output } => {
            let renamer = json_tree::rename_campaign_events(&campaign, &output)?;
            for (original, slot) in renamer.mapping() {
                println!("{} -> {}", original, slot);
            }
        }
    }

    Ok(())
}

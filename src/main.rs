// src/main.rs

use fanout::{cli, logging, run, sched::RunReport};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(report) => std::process::exit(exit_code(&report)),
        Err(err) => {
            eprintln!("fanout error: {err:?}");
            std::process::exit(2);
        }
    }
}

async fn run_main() -> anyhow::Result<RunReport> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    Ok(run(args).await?)
}

fn exit_code(report: &RunReport) -> i32 {
    if report.interrupted {
        130
    } else if report.failed > 0 {
        1
    } else {
        0
    }
}

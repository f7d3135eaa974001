// src/main.rs

use taskdock::{cli, logging, run};

#[tokio::main]
async fn main() {
    std::process::exit(match run_main().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("taskdock error: {err:?}");
            2
        }
    });
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}

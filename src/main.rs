use clap::Parser;
use ev_supervisor::supervisor::launch;
use ev_supervisor::{cli, exit_codes, logging};

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    let task = args.task.clone();

    let config = match args.into_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("❌ {:#}", err);
            std::process::exit(exit_codes::FAILURE);
        }
    };
    logging::init(config.verbose);

    match launch(&config, &task).await {
        Ok(outcome) => {
            let state = &outcome.state;
            println!("\n📊 执行步数: {}", state.total_steps());
            println!("📍 最终阶段: {}", state.stage());
            println!("🔁 失败次数: {}", state.retry_count());
            println!("\n{}", state.final_report().unwrap_or_default());
            for path in outcome.saved.paths() {
                println!("📁 {}", path.display());
            }
        }
        Err(err) => {
            eprintln!("❌ {:#}", err);
            std::process::exit(exit_codes::for_error(&err));
        }
    }
}

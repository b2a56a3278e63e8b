//! Emotion timeline binary.

use clap::Parser;
use tracing::{error, info};

use emoline_classifier::ClassifierConfig;
use emoline_cli::commands::{run_live, run_segments};
use emoline_cli::logging::init_tracing;
use emoline_cli::{Cli, Command, PipelineConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("{:#}", e);
        std::process::exit(2);
    }

    let cli = Cli::parse();
    let mut config = PipelineConfig::from_env();

    let result = match &cli.command {
        Command::Live(args) => {
            args.apply(&mut config);
            run_live(args, &config, ClassifierConfig::from_env())
                .await
                .and_then(|summary| Ok(serde_json::to_string(&summary)?))
        }
        Command::Segments(args) => {
            args.apply(&mut config);
            run_segments(args, &config)
                .await
                .and_then(|summary| Ok(serde_json::to_string(&summary)?))
        }
    };

    match result {
        Ok(summary) => info!(summary = %summary, "Done"),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

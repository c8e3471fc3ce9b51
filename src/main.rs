use clap::Parser;
use ocr_processor::batch;
use ocr_processor::config::{Args, Command, Config};
use ocr_processor::processor::DocumentProcessor;
use ocr_processor::server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let command = args.command.clone();
    let config = Config::from(args);

    match command {
        None | Some(Command::Serve) => {
            tracing::info!("Starting ocr-processor v{}", env!("CARGO_PKG_VERSION"));
            tracing::info!("Binding to {}", config.bind_address());

            server::run(config).await
        }
        Some(Command::Process {
            files,
            output_dir,
            prefix,
        }) => {
            let processor = DocumentProcessor::from_config(&config)?
                .with_span(tracing::info_span!("cli"));
            let entries = batch::process_files(&processor, &files, output_dir.as_deref(), &prefix)?;

            if output_dir.is_none() {
                batch::print_entries(&entries, std::io::stdout().lock())?;
            }

            Ok(())
        }
    }
}

//! # Memeforge
//!
//! Export and manage meme documents from the command line.

use clap::Parser;
use meme_cli::{CliArgs, CliConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = CliConfig::from(&args);
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        out_dir = %config.out_dir.display(),
        timeout_ms = config.image_timeout.as_millis(),
        "starting memeforge"
    );

    let report = meme_cli::run(&config, args.command).await?;
    print!("{report}");
    if !report.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Initialize tracing to stderr, with JSON output when `RUST_LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,meme_cli=info,meme_core=info,meme_renderer=info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pdxrpc::config::{Config, Settings};
use pdxrpc::games;
use pdxrpc::monitor::Monitor;
use pdxrpc::presence::DiscordSink;
use pdxrpc::scanner::ProcessScanner;
use pdxrpc::status::LogStatus;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging
    setup_logging(cli.debug);

    // Load settings
    let mut settings = Settings::load(cli.config.as_ref())?;
    settings.merge_cli(&cli);
    settings.validate();

    for sig in games::all() {
        tracing::info!("registered game: {} ({})", sig.display_name, sig.process_key);
    }

    if cli.is_check_mode() {
        return run_check();
    }

    // Run the monitor loop
    let mut monitor = Monitor::new(settings, Box::new(DiscordSink::new()), Box::new(LogStatus));
    monitor.run().await
}

/// One-shot detection scan, for troubleshooting.
fn run_check() -> Result<()> {
    match ProcessScanner::new().scan() {
        Some(sig) => println!("detected: {}", sig.display_name),
        None => println!("no supported game running"),
    }
    Ok(())
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("pdxrpc=debug")
    } else {
        EnvFilter::new("pdxrpc=info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

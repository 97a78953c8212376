use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use serial_relay::cli::Args;
use serial_relay::serial::list_ports;
use serial_relay::{RelayConfig, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging; RUST_LOG wins over --debug
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.default_log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if args.list {
        let ports = list_ports().wrap_err("Failed to enumerate serial ports")?;
        if ports.is_empty() {
            println!("No serial ports found");
        }
        for port in ports {
            println!("{port}");
        }
        return Ok(());
    }

    let config = RelayConfig::from(&args);
    config.validate().wrap_err("Invalid arguments")?;

    // Nothing is started unless both ports open
    let (port_a, port_b) =
        Session::open_serial(&config).wrap_err("Failed to open serial ports")?;

    let session = Session::start(port_a, port_b, config.forwarder.clone())
        .wrap_err("Failed to start forwarding")?;

    info!(
        a = %config.port_a.path,
        b = %config.port_b.path,
        "Relaying, press Ctrl+C to exit"
    );

    if let Some(interrupted) = session.run_until(tokio::signal::ctrl_c()).await {
        interrupted.wrap_err("Failed to listen for Ctrl+C")?;
    }

    info!("Exiting");
    Ok(())
}

use std::time::Duration;

use clap::Parser;
use ht3_driver::decoder::variable_info;
use ht3_driver::{Driver, DriverEvent, HcMode};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "ht3-monitor")]
#[command(about = "Watch a Heatronic bus gateway and print value changes", long_about = None)]
struct Args {
    /// Gateway host
    #[arg(short = 'H', long, default_value = "localhost")]
    host: String,

    /// Gateway port
    #[arg(short = 'P', long, default_value = "8088")]
    port: u16,

    /// Device type sent during registration
    #[arg(long, default_value = "RX")]
    device_type: String,

    /// Seconds between reconnect attempts
    #[arg(long, default_value = "10")]
    reconnect_secs: u64,

    /// Print one JSON object per change
    #[arg(long)]
    json: bool,

    /// Write this requested room temperature (°C) once connected
    #[arg(long)]
    setpoint: Option<f64>,

    /// Write this heating circuit mode once connected (frost, eco, comfort, auto)
    #[arg(long)]
    mode: Option<HcMode>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let driver = Driver::builder(args.host.as_str())
        .port(args.port)
        .device_type(args.device_type.as_str())
        .reconnect_interval(Duration::from_secs(args.reconnect_secs))
        .start();
    let mut events = driver.events();

    if args.setpoint.is_some() || args.mode.is_some() {
        if !driver.connect().await {
            return Err(format!("cannot connect to {}:{}", args.host, args.port).into());
        }
        if let Some(degrees) = args.setpoint {
            driver.write_setpoint(degrees).await?;
        }
        if let Some(mode) = args.mode {
            driver.write_mode(mode).await?;
        }
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(DriverEvent::Changed { name, value }) => {
                    let unit = variable_info(name).and_then(|info| info.unit);
                    if args.json {
                        let line = serde_json::json!({
                            "name": name,
                            "value": value,
                            "unit": unit,
                        });
                        println!("{}", line);
                    } else if let Some(unit) = unit {
                        println!("{} = {} {}", name, value, unit);
                    } else {
                        println!("{} = {}", name, value);
                    }
                }
                Ok(DriverEvent::Connected { client_id }) => {
                    eprintln!("Connected as {}", client_id);
                }
                Ok(DriverEvent::Disconnected) => {
                    eprintln!("Disconnected");
                }
                Err(RecvError::Lagged(missed)) => {
                    eprintln!("Missed {} events", missed);
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    driver.shutdown().await;
    Ok(())
}

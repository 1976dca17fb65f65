//! bletool - advertise or passively scan over a raw HCI socket
//!
//! ```text
//! bletool -s 0102AABB -m 32 -M 64   # advertise for one second
//! bletool -r                        # print advertising reports until Ctrl-C
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr and
//! reports to stdout.

use anyhow::{Context, Result};
use bletool::{
    interrupt_token, AdvertiseParams, Advertiser, AdvertisingData, HciDevice, ScanParams, Scanner,
};
use clap::{CommandFactory, Parser};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bletool", about = "BLE advertise and scan tool", version)]
struct Cli {
    /// Receive mode: print advertising reports until interrupted
    #[arg(short, long, conflicts_with = "send")]
    read: bool,

    /// Send advertisements carrying HEX_STRING after the fixed header
    #[arg(short, long, value_name = "HEX_STRING")]
    send: Option<String>,

    /// Minimum interval between adverts
    #[arg(short = 'm', long = "min_interval", value_name = "MS", default_value_t = 32)]
    min_interval: u16,

    /// Maximum interval between adverts
    #[arg(short = 'M', long = "max_interval", value_name = "MS", default_value_t = 64)]
    max_interval: u16,

    /// Adapter to use, falling back to the first adapter that is up
    #[arg(short, long, default_value = "hci0")]
    device: String,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    print!("{}", interval_banner(&cli));

    let device = HciDevice::new(&cli.device);

    if let Some(hex) = &cli.send {
        let params = AdvertiseParams {
            min_interval: cli.min_interval,
            max_interval: cli.max_interval,
        };
        advertise(&device, params, hex)?;
        Ok(ExitCode::SUCCESS)
    } else if cli.read {
        scan(&device)
    } else {
        Cli::command().print_help()?;
        Ok(ExitCode::SUCCESS)
    }
}

fn interval_banner(cli: &Cli) -> String {
    format!(
        "ble_min_interval: {}\nble_max_interval: {}\n",
        cli.min_interval, cli.max_interval
    )
}

fn advertise(device: &HciDevice, params: AdvertiseParams, hex: &str) -> Result<()> {
    let data = AdvertisingData::from_hex_tail(hex).context("invalid advertising data")?;
    Advertiser::new(device, params)
        .advertise(&data)
        .with_context(|| format!("advertising on {} failed", device.name()))
}

fn scan(device: &HciDevice) -> Result<ExitCode> {
    let cancel = interrupt_token().context("could not install SIGINT handler")?;
    let scanner = Scanner::new(device, ScanParams::default());

    let session = match scanner.start() {
        Ok(session) => session,
        Err(e) if !e.is_fatal() => {
            warn!(error = %e, "scan setup incomplete, disabling scan");
            scanner
                .stop_detached()
                .context("could not disable scan")?;
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e).context("could not start scan"),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let delivered = session
        .run(&cancel, |report| writeln!(out, "{report}"))
        .context("scan ended with an error")?;

    info!(delivered, "scan finished");
    Ok(ExitCode::SUCCESS)
}

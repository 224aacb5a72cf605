use std::io;

use camino::Utf8PathBuf;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use whitepoint::calibrate::calibrate;
use whitepoint::channel::Pinning;
use whitepoint::config::{self, Overrides};
use whitepoint::device::framebuffer::Framebuffer;
use whitepoint::device::spotread::Spotread;
use whitepoint::device::Colorimeter;
use whitepoint::error::CalResult;
use whitepoint::search::Strategy;

/// Drive a display towards the D65 white point using a colorimeter
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Configuration file (yaml, optional)
    #[arg(short, long, default_value = "whitepoint.yaml")]
    config: Utf8PathBuf,

    /// Search strategy
    #[arg(short, long, value_enum)]
    strategy: Option<Strategy>,

    /// Which channel stays at full output
    #[arg(long, value_enum)]
    pin: Option<Pinning>,

    /// Random seed for the secant search
    #[arg(long)]
    seed: Option<u64>,

    /// Framebuffer device
    #[arg(short, long)]
    device: Option<Utf8PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn init_logging() -> CalResult<()> {
    let mut builder = pretty_env_logger::formatted_timed_builder();

    if let Ok(s) = ::std::env::var("RUST_LOG") {
        builder.parse_filters(&s);
    } else {
        builder.parse_filters("info");
    }

    Ok(builder.try_init()?)
}

fn run() -> CalResult<()> {
    let args = Args::parse();

    init_logging()?;

    let overrides = Overrides {
        strategy: args.strategy,
        pinning: args.pin,
        seed: args.seed,
        device: args.device,
    };
    let conf = config::parse(&args.config, &overrides)?;
    log::debug!("Configuration loaded successfully");

    if args.print_config {
        print!("{}", serde_yaml::to_string(&conf)?);
        return Ok(());
    }

    let mut rng = conf
        .search
        .secant
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

    let mut display = Framebuffer::open(&conf.display)?;
    let mut meter = Spotread::spawn(&conf.meter)?;

    match calibrate(&mut display, &mut meter, io::stdout().lock(), &conf, &mut rng) {
        Ok(_) => meter.shutdown(),
        Err(err) => {
            if let Err(e) = meter.shutdown() {
                log::warn!("Meter shutdown failed: {e}");
            }
            Err(err)
        }
    }
}

fn main() {
    if let Err(err) = run() {
        log::error!("Whitepoint error: {err}");
        log::error!("Fatal error encountered, cannot continue.");
        std::process::exit(1);
    }
}

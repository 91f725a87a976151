//! PWM fade demo
//!
//! Ramps one output's duty cycle from 0% to 100% and back until Ctrl-C or
//! until the requested number of cycles is done, then releases every
//! output it started.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use bbpwm::{ChannelManager, Polarity, SysfsConfig, SysfsDriver, DEFAULT_FREQUENCY_HZ};
use clap::Parser;
use colored::Colorize;
use log::debug;

#[derive(Parser)]
#[command(name = "pwm_demo")]
#[command(version = "0.1.0")]
#[command(about = "Fade a BeagleBone PWM output up and down", long_about = None)]
struct Cli {
    /// Output to drive, e.g. P9_22 or EHRPWM0A
    channel: String,

    /// PWM frequency in Hz
    #[arg(short, long, default_value_t = DEFAULT_FREQUENCY_HZ)]
    frequency: f64,

    /// Duty cycle change per step, in percent
    #[arg(short, long, default_value_t = 5.0)]
    step: f64,

    /// Time between steps, in milliseconds
    #[arg(short = 'd', long, default_value_t = 50)]
    step_ms: u64,

    /// Number of up-and-down cycles; 0 runs until Ctrl-C
    #[arg(short = 'n', long, default_value_t = 0)]
    cycles: u32,

    /// Drive the output with inversed polarity
    #[arg(short, long)]
    inverse: bool,

    /// Sysfs driver configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    if !(cli.step > 0.0 && cli.step <= 100.0) {
        anyhow::bail!("--step must be in (0, 100], got {}", cli.step);
    }

    let config = match &cli.config {
        Some(path) => SysfsConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SysfsConfig::default(),
    };
    let pwm = ChannelManager::sysfs(config).context("Invalid sysfs configuration")?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("Failed to install Ctrl-C handler")?;
    }

    let result = fade(&pwm, &cli, &running);

    pwm.cleanup_all();
    println!("{}", "Released all PWM outputs".green());
    result
}

fn fade(pwm: &ChannelManager<SysfsDriver>, cli: &Cli, running: &AtomicBool) -> Result<()> {
    let polarity = if cli.inverse {
        Polarity::Inversed
    } else {
        Polarity::Normal
    };
    pwm.start_with_polarity(&cli.channel, 0.0, cli.frequency, polarity)
        .with_context(|| format!("Failed to start {}", cli.channel))?;

    println!(
        "{} {} at {} Hz ({polarity}), Ctrl-C to stop",
        "Fading".cyan(),
        cli.channel.green(),
        cli.frequency
    );

    let delay = Duration::from_millis(cli.step_ms);
    let mut duty = 0.0_f64;
    let mut rising = true;
    let mut cycles_done = 0;

    while running.load(Ordering::SeqCst) {
        duty = if rising {
            (duty + cli.step).min(100.0)
        } else {
            (duty - cli.step).max(0.0)
        };
        pwm.set_duty_cycle(&cli.channel, duty)
            .with_context(|| format!("Failed to set duty cycle of {}", cli.channel))?;
        debug!("{}: {duty:.1}%", cli.channel);

        if duty >= 100.0 {
            rising = false;
        } else if duty <= 0.0 {
            rising = true;
            cycles_done += 1;
            if cli.cycles != 0 && cycles_done >= cli.cycles {
                break;
            }
        }
        thread::sleep(delay);
    }

    pwm.stop(&cli.channel)
        .with_context(|| format!("Failed to stop {}", cli.channel))?;
    Ok(())
}

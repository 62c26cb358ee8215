//! morse-play - send text as Morse code
//!
//! Plays through ALSA when built with the `alsa` feature, or renders a WAV
//! file with `--output`. Settings come from the config files and `MORSE_*`
//! variables (see `morseconf`), with command-line flags on top.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use morse::{MorseError, Session, SessionConfig, Sink, Timing, WavSink};
use morseconf::{ConfigSources, MorseConfig};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "morse-play")]
#[command(about = "Play text as Morse code")]
#[command(version)]
struct Cli {
    /// Speed in words per minute
    #[arg(short = 's', long, value_parser = clap::value_parser!(u32).range(5..=60))]
    wpm: Option<u32>,

    /// Speed in words per minute, with Farnsworth spacing below 18 WPM
    #[arg(
        short = 'f',
        long,
        value_name = "WPM",
        conflicts_with = "wpm",
        value_parser = clap::value_parser!(u32).range(5..=60)
    )]
    farnsworth: Option<u32>,

    /// Volume in percent
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=100))]
    amplitude: Option<u32>,

    /// Tone pitch in Hz
    #[arg(long, value_name = "HZ", value_parser = parse_tone)]
    tone: Option<f64>,

    /// Output sample rate in Hz
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    sample_rate: Option<u32>,

    /// Write a WAV file instead of playing
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// ALSA device name
    #[arg(long)]
    device: Option<String>,

    /// Config file, used instead of ./morse.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the derived timing as JSON before sending
    #[arg(long)]
    show_timing: bool,

    /// Print the text as dots and dashes before sending
    #[arg(long)]
    print_code: bool,

    /// Text to send; words are joined with single spaces
    #[arg(required = true)]
    text: Vec<String>,
}

fn parse_tone(s: &str) -> Result<f64, String> {
    let hz: f64 = s.parse().map_err(|e| format!("{s:?} is not a number: {e}"))?;
    if hz.is_finite() && hz > 0.0 {
        Ok(hz)
    } else {
        Err(format!("tone must be a positive frequency, got {hz}"))
    }
}

/// Settings from the config, with flags given on the command line winning.
fn session_config(cli: &Cli, config: &MorseConfig) -> SessionConfig {
    let (wpm, farnsworth) = match (cli.farnsworth, cli.wpm) {
        (Some(wpm), _) => (wpm, true),
        (None, Some(wpm)) => (wpm, false),
        (None, None) => (config.keyer.wpm, config.keyer.farnsworth),
    };

    SessionConfig::new(wpm)
        .with_farnsworth(farnsworth)
        .with_amplitude(cli.amplitude.unwrap_or(config.keyer.amplitude))
        .with_tone_frequency(cli.tone.unwrap_or(config.keyer.tone_frequency))
        .with_sample_rate(cli.sample_rate.unwrap_or(config.audio.sample_rate))
        .with_latency(Duration::from_micros(config.audio.latency_us))
}

#[derive(Debug, Serialize)]
struct TimingReport {
    wpm: u32,
    farnsworth: bool,
    sample_rate: u32,
    tone_frequency: f64,
    #[serde(flatten)]
    timing: Timing,
}

impl TimingReport {
    fn new<S: Sink>(session: &Session<S>) -> Self {
        Self {
            wpm: session.wpm(),
            farnsworth: session.farnsworth(),
            sample_rate: session.sample_rate(),
            tone_frequency: session.tone_frequency(),
            timing: session.timing(),
        }
    }
}

fn open_sink(cli: &Cli, config: &MorseConfig) -> Result<Box<dyn Sink>> {
    if let Some(path) = &cli.output {
        info!(path = %path.display(), "rendering to WAV file");
        return Ok(Box::new(WavSink::create(path)));
    }

    let device = cli.device.as_deref().unwrap_or(&config.audio.device);
    open_device(device)
}

#[cfg(feature = "alsa")]
fn open_device(device: &str) -> Result<Box<dyn Sink>> {
    let sink = morse::sink::AlsaSink::open(device)
        .with_context(|| format!("opening audio device {device}"))?;
    Ok(Box::new(sink))
}

#[cfg(not(feature = "alsa"))]
fn open_device(device: &str) -> Result<Box<dyn Sink>> {
    anyhow::bail!(
        "cannot play on {device}: built without ALSA support; \
         use --output FILE.wav or build with --features alsa"
    )
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(|p| morseconf::expand_path(&p.to_string_lossy()));
    let (config, sources): (MorseConfig, ConfigSources) =
        MorseConfig::load_with_sources_from(config_path.as_deref())
            .context("loading configuration")?;

    init_tracing(&config.telemetry.log_level);
    debug!(files = ?sources.files, env = ?sources.env_overrides, "configuration loaded");

    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupt_flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        interrupt_flag.store(true, Ordering::SeqCst);
    })?;

    let sink = open_sink(&cli, &config)?;
    let mut session = Session::new(sink, session_config(&cli, &config))
        .context("invalid session settings")?
        .with_interrupt(interrupted);

    let text = cli.text.join(" ");
    if cli.print_code {
        println!("{}", morse::encode(&text));
    }
    if cli.show_timing {
        println!("{}", serde_json::to_string_pretty(&TimingReport::new(&session))?);
    }

    match session.send_string(&text) {
        Ok(()) => {}
        Err(MorseError::Cancelled) => warn!("interrupted, letting queued audio finish"),
        Err(e) => return Err(e).context("sending text"),
    }

    session.drain().context("draining audio")?;
    println!("Total time: {:.2} seconds.", session.timestamp());
    session.close().context("closing audio device")?;

    Ok(())
}

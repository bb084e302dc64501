//! Crossdeck Render - headless two-deck mix renderer
//!
//! Loads one file onto each deck, sweeps the crossfader from deck A to deck B
//! and writes the master output to a WAV file. It:
//! 1. Loads the YAML config (engine and mix layout)
//! 2. Builds a deck engine on an offline render graph
//! 3. Loads both tracks (they auto-play)
//! 4. Renders block by block, ticking the engine after each block
//!
//! ## Command line
//!
//! ```text
//! crossdeck-render <deck-a> <deck-b> [--out PATH] [--seconds N] [--config PATH] [--write-config]
//! ```
//!
//! - `--out`: output WAV path (overrides `mix.output`)
//! - `--seconds`: mix length (overrides `mix.seconds`)
//! - `--config`: config file (default ~/.config/crossdeck/render.yaml)
//! - `--write-config`: save the effective config back to the config path

mod config;
mod mix;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossdeck_core::audio::OfflineGraph;
use crossdeck_core::config::{load_config, save_config};
use crossdeck_core::engine::DeckEngine;
use crossdeck_core::DeckId;

use config::RenderConfig;

/// Upper bound on decoding both input files
const LOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Parsed command line
#[derive(Debug, Default, PartialEq)]
struct Args {
    inputs: Vec<PathBuf>,
    out: Option<PathBuf>,
    seconds: Option<f64>,
    config: Option<PathBuf>,
    write_config: bool,
}

fn parse_args<I>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = Args::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" => {
                let value = args.next().context("--out needs a path")?;
                parsed.out = Some(PathBuf::from(value));
            }
            "--seconds" => {
                let value = args.next().context("--seconds needs a value")?;
                let seconds: f64 = value
                    .parse()
                    .with_context(|| format!("Invalid --seconds value: {}", value))?;
                if !seconds.is_finite() || seconds <= 0.0 {
                    bail!("--seconds must be positive, got {}", seconds);
                }
                parsed.seconds = Some(seconds);
            }
            "--config" => {
                let value = args.next().context("--config needs a path")?;
                parsed.config = Some(PathBuf::from(value));
            }
            "--write-config" => parsed.write_config = true,
            flag if flag.starts_with("--") => bail!("Unknown flag: {}", flag),
            _ => parsed.inputs.push(PathBuf::from(arg)),
        }
    }

    if parsed.inputs.len() != 2 {
        bail!(
            "Expected two input files (deck A, deck B), got {}",
            parsed.inputs.len()
        );
    }
    Ok(parsed)
}

fn main() -> Result<()> {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    log::info!("crossdeck-render starting up");

    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    let mut config: RenderConfig = load_config(&config_path);
    if let Some(out) = &args.out {
        config.mix.output = out.clone();
    }
    if let Some(seconds) = args.seconds {
        config.mix.seconds = seconds;
    }
    if args.write_config {
        save_config(&config, &config_path)?;
    }

    let graph = OfflineGraph::new(config.engine.sample_rate);
    let mut engine = DeckEngine::new(graph, config.engine.clone())
        .context("Failed to start deck engine")?;

    for (deck, path) in [DeckId::A, DeckId::B].into_iter().zip(&args.inputs) {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
        log::info!("{}: {:?}", deck, path);
        engine.load(deck, bytes);
    }

    if !engine.wait_for_loads(LOAD_TIMEOUT) {
        bail!("Timed out decoding input files");
    }
    for deck in [DeckId::A, DeckId::B] {
        if !engine.has_track(deck) {
            bail!("{} has no track: decoding failed (see log)", deck);
        }
        log::info!("{}: {:.2}s", deck, engine.duration(deck));
    }

    let spec = mix::wav_spec(engine.graph().sample_rate());
    let mut writer = hound::WavWriter::create(&config.mix.output, spec)
        .with_context(|| format!("Failed to create {:?}", config.mix.output))?;
    let stats = mix::render_mix(&mut engine, &config.mix, &mut writer)?;
    writer.finalize().context("Failed to finalize WAV file")?;

    log::debug!("Final state:\n{}", engine.debug_report());
    log::info!(
        "Wrote {:?}: {} frames in {} blocks, peak {:.3}",
        config.mix.output,
        stats.frames,
        stats.blocks,
        stats.peak
    );
    Ok(())
}

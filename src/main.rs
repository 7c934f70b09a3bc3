//! gradus — check, flatten and play scale-degree programs.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};

use gradus::event::{ManualClock, PitchEvent, WallClock};
use gradus::instrument::InstrumentRouter;
use gradus::{parse_program, CompileError, EngineConfig, Performance, Song};

#[derive(Parser)]
#[command(name = "gradus", version)]
#[command(about = "Scale-degree notation engine")]
struct Cli {
    /// Config file (defaults to ~/.gradus/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and compile a program, reporting the first error
    Check { file: PathBuf },

    /// Print each part's flattened events
    Flatten {
        file: PathBuf,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Only this part
        #[arg(long)]
        part: Option<String>,
    },

    /// Play a program in real time, printing every trigger
    Play {
        file: PathBuf,

        #[arg(long, value_parser = parse_bpm)]
        bpm: Option<f64>,

        /// Stop after this many ticks
        #[arg(long)]
        max_ticks: Option<u64>,
    },
}

#[derive(Serialize)]
struct PartDump<'a> {
    name: &'a str,
    unbounded: bool,
    loop_start: usize,
    events: &'a [PitchEvent],
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match EngineConfig::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: cannot read config {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::load().unwrap_or_default(),
    };
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    let level: Level = config.log_level.parse().unwrap_or(Level::WARN);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Check { file } => load_song(&file).map(|song| {
            println!(
                "{}: ok ({} parts, {} blocks, {} variables)",
                file.display(),
                song.parts.len(),
                song.blocks.len(),
                song.variables.len()
            );
        }),
        Commands::Flatten { file, json, part } => {
            load_song(&file).and_then(|song| flatten(song, &config, json, part.as_deref()))
        }
        Commands::Play {
            file,
            bpm,
            max_ticks,
        } => {
            if let Some(bpm) = bpm {
                config.bpm = bpm;
            }
            if max_ticks.is_some() {
                config.max_ticks = max_ticks;
            }
            config
                .validate()
                .map_err(|e| format!("error: invalid config: {e}"))
                .and_then(|()| load_song(&file))
                .and_then(|song| play(song, &config))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn parse_bpm(s: &str) -> Result<f64, String> {
    let bpm: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if bpm.is_finite() && bpm > 0.0 {
        Ok(bpm)
    } else {
        Err(format!("bpm must be a positive number, got {s}"))
    }
}

fn load_song(path: &Path) -> Result<Song, String> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("error: cannot read {}: {e}", path.display()))?;
    parse_program(&source).map_err(|e| describe_error(path, &e))
}

/// The error line plus the offending source line with a caret under the
/// column.
fn describe_error(path: &Path, err: &CompileError) -> String {
    let mut out = format!("{}:{err}", path.display());
    if let Some(line) = err.source_line() {
        out.push_str(&format!(
            "\n  {line}\n  {}^",
            " ".repeat(err.col.saturating_sub(1))
        ));
    }
    out
}

fn flatten(song: Song, config: &EngineConfig, json: bool, only: Option<&str>) -> Result<(), String> {
    if let Some(name) = only {
        if song.part(name).is_none() {
            return Err(format!("error: no part named '{name}'"));
        }
    }
    let names: Vec<String> = song
        .parts
        .iter()
        .map(|p| p.name.clone())
        .filter(|n| only.map_or(true, |o| *n == o))
        .collect();

    let router = InstrumentRouter::new();
    let clock = Box::new(ManualClock::new(config.bpm));
    let perf = Performance::from_config(song, config, clock, router);

    let mut flattened = Vec::new();
    for name in &names {
        if let Some(flat) = perf.preview_part(name) {
            flattened.push((name.as_str(), flat));
        }
    }

    if json {
        let dump: Vec<PartDump> = flattened
            .iter()
            .map(|(name, flat)| PartDump {
                name,
                unbounded: flat.unbounded,
                loop_start: flat.loop_start,
                events: &flat.events,
            })
            .collect();
        let text = serde_json::to_string_pretty(&dump).map_err(|e| format!("error: {e}"))?;
        println!("{text}");
        return Ok(());
    }

    for (name, flat) in &flattened {
        if flat.unbounded {
            println!("part {name} (loops from event {})", flat.loop_start);
        } else {
            println!("part {name}");
        }
        for (idx, event) in flat.events.iter().enumerate() {
            let kind = match event {
                PitchEvent::Note { .. } => "note",
                PitchEvent::Rest { .. } => "rest",
                PitchEvent::Chord { .. } => "chord",
                PitchEvent::Arpeggio { .. } => "arp",
            };
            println!(
                "{idx:>5}  {:<5} {:<6} {:?}",
                kind,
                event.duration().to_string(),
                event.pitch_numbers()
            );
        }
    }
    Ok(())
}

fn play(song: Song, config: &EngineConfig) -> Result<(), String> {
    let router = InstrumentRouter::logging(&song);
    let clock = WallClock::new(config.bpm);
    let stop = clock.stop_flag();
    ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
        .map_err(|e| format!("error: cannot install Ctrl-C handler: {e}"))?;

    let mut perf = Performance::from_config(song, config, Box::new(clock), router);
    info!(bpm = config.bpm, tick_interval = config.tick_interval(), "playing");
    let ticks = perf.run_ticks(config.max_ticks);
    perf.stop();
    info!(ticks, "done");
    Ok(())
}

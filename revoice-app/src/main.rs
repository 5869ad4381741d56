//! revoice - voice filter playback and export
//!
//! Thin CLI over the engine crate: pick a built-in filter, then either
//! play a source file through it or render it to a WAV file offline.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::bail;
use clap::{Parser, Subcommand};

use revoice_audio::{preset, AudioEngine, PlaybackState, Preset};

#[derive(Parser)]
#[command(name = "revoice")]
#[command(about = "Voice filter playback and offline render", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a source file through a voice filter
    Play {
        /// Audio file to play
        input: PathBuf,

        /// Voice filter to apply
        #[arg(short, long, default_value = "clear")]
        preset: String,

        /// Restart the source when it ends, until interrupted
        #[arg(long = "loop")]
        repeat: bool,
    },

    /// Render a source file through a voice filter to a WAV file
    Render {
        /// Audio file to render
        input: PathBuf,

        /// Output WAV path
        output: PathBuf,

        /// Voice filter to apply
        #[arg(short, long, default_value = "clear")]
        preset: String,
    },

    /// List the built-in voice filters
    Presets,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            input,
            preset,
            repeat,
        } => {
            let preset = resolve_preset(&preset)?;
            let mut engine = AudioEngine::new();
            engine.apply(preset);

            if repeat {
                engine.load(&input)?;
                engine.replay()?;
                println!(
                    "Looping {} [{}], Ctrl-C to stop",
                    input.display(),
                    preset.name
                );
                loop {
                    thread::sleep(Duration::from_secs(1));
                }
            }

            engine.play(&input)?;
            println!("Playing {} [{}]", input.display(), preset.name);
            while engine.playback_state() != PlaybackState::Idle {
                thread::sleep(Duration::from_millis(100));
            }
            Ok(())
        }

        Commands::Render {
            input,
            output,
            preset,
        } => {
            let preset = resolve_preset(&preset)?;
            let mut engine = AudioEngine::new();
            engine.load(&input)?;
            engine.apply(preset);

            let rendered = engine.render_offline(&output)?.wait()?;
            println!(
                "Rendered {} [{}] -> {} ({:.2}s, {} frames)",
                input.display(),
                preset.name,
                rendered.path.display(),
                rendered.duration_secs,
                rendered.frames
            );
            Ok(())
        }

        Commands::Presets => {
            for p in &preset::BUILT_IN {
                println!(
                    "{:<8} pitch {:+5.0} cents | speed {:.2}x | reverb {:3.0} | drive {:+3.0} dB at {:3.0}%",
                    p.name,
                    p.pitch_cents,
                    p.speed,
                    p.reverb_mix,
                    p.distortion.pre_gain_db,
                    p.distortion.mix
                );
            }
            Ok(())
        }
    }
}

fn resolve_preset(name: &str) -> anyhow::Result<&'static Preset> {
    match preset::find(name) {
        Some(p) => Ok(p),
        None => {
            let names: Vec<&str> = preset::BUILT_IN.iter().map(|p| p.name).collect();
            bail!("Unknown preset '{}' (available: {})", name, names.join(", "));
        }
    }
}

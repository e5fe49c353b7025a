use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::Vec2;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tileworld_common::{CHUNK_SIZE, TileType};
use tileworld_kernel::DecorationKind;
use tileworld_protocol::decode;
use tileworld_render::DebugTextRenderer;
use tileworld_session::{ClientConfig, FrameDriver, MemoryTransport, Session};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tileworld-cli", about = "Headless tools for tileworld packet logs")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, world constants and the default client config
    Info,
    /// Decode a packet log (one JSON frame per line) and summarize it
    Decode {
        file: PathBuf,
    },
    /// Feed a packet log through a session and print the debug render
    Replay {
        /// Packet log, one JSON frame per line
        #[arg(short, long)]
        packets: PathBuf,
        /// Number of frames to run
        #[arg(short, long, default_value = "10")]
        frames: usize,
        /// Frame period in milliseconds
        #[arg(long, default_value = "16")]
        period_ms: u64,
        /// Only print the final frame
        #[arg(long)]
        last: bool,
        /// JSON client config
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn read_frames(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let frames: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect();
    tracing::debug!(path = %path.display(), frames = frames.len(), "packet log read");
    Ok(frames)
}

/// Packet type counts plus the lines that failed to decode.
fn summarize(frames: &[String]) -> (BTreeMap<&'static str, usize>, Vec<(usize, String)>) {
    let mut counts = BTreeMap::new();
    let mut failures = Vec::new();
    for (i, frame) in frames.iter().enumerate() {
        match decode(frame) {
            Ok(packet) => *counts.entry(packet.packet_type()).or_insert(0) += 1,
            Err(err) => failures.push((i + 1, err.to_string())),
        }
    }
    (counts, failures)
}

fn replay(
    frames: Vec<String>,
    config: ClientConfig,
    count: usize,
    period: Duration,
    mut on_frame: impl FnMut(usize, String),
) -> anyhow::Result<FrameDriver<MemoryTransport, DebugTextRenderer>> {
    let mut transport = MemoryTransport::new();
    for frame in frames {
        transport.push_inbound(frame);
    }
    let mut session = Session::new(config, transport);
    session.start()?;
    let mut driver = FrameDriver::new(session, DebugTextRenderer::new(Vec2::new(800.0, 600.0)));
    for i in 0..count {
        on_frame(i, driver.frame(period));
    }
    Ok(driver)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("tileworld-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("chunk size: {CHUNK_SIZE}");
            let tiles: Vec<_> = TileType::ALL.iter().map(|t| format!("{t:?}")).collect();
            println!("tiles: {}", tiles.join(", "));
            let kinds: Vec<_> = DecorationKind::ALL.iter().map(|k| k.as_str()).collect();
            println!("decorations: {}", kinds.join(", "));
            println!(
                "default config: {}",
                serde_json::to_string_pretty(&ClientConfig::default())?
            );
        }
        Commands::Decode { file } => {
            let frames = read_frames(&file)?;
            let (counts, failures) = summarize(&frames);
            println!("{} frames in {}", frames.len(), file.display());
            for (kind, n) in &counts {
                println!("  {kind}: {n}");
            }
            for (line, err) in &failures {
                println!("  line {line}: {err}");
            }
        }
        Commands::Replay {
            packets,
            frames,
            period_ms,
            last,
            config,
        } => {
            let config = match config {
                Some(path) => ClientConfig::load(&path)?,
                None => ClientConfig::default(),
            };
            let log = read_frames(&packets)?;
            println!("Replaying {} frames over {frames} ticks", log.len());

            let period = Duration::from_millis(period_ms);
            let driver = replay(log, config, frames, period, |i, out| {
                if !last || i + 1 == frames {
                    print!("{out}");
                }
            })?;

            let stats = driver.stats();
            println!(
                "State: {:?}  packets={} warnings={} evicted={}+{} ticks={}",
                driver.session().state(),
                stats.packets,
                stats.warnings,
                stats.evicted_entities,
                stats.evicted_chunks,
                stats.animation_ticks
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileworld_session::SessionState;

    fn log() -> Vec<String> {
        [
            r#"{"packet_type":"player_registered","id":"p1"}"#,
            r#"{"packet_type":"entity_load","entity":{"id":"t1","position":{"x":3,"y":4},"value":"forest_tree"}}"#,
            r#"{"packet_type":"entity_move","id":"ghost","new_position":{"x":1,"y":1}}"#,
            r#"{"packet_type":"warp"}"#,
        ]
        .map(str::to_owned)
        .to_vec()
    }

    #[test]
    fn summarize_counts_types_and_failures() {
        let (counts, failures) = summarize(&log());
        assert_eq!(counts["player_registered"], 1);
        assert_eq!(counts["entity_move"], 1);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, 4);
    }

    #[test]
    fn replay_runs_the_session() {
        let mut outputs = Vec::new();
        let driver = replay(log(), ClientConfig::default(), 3, Duration::from_millis(16), |_, out| {
            outputs.push(out)
        })
        .unwrap();
        assert_eq!(outputs.len(), 3);
        assert!(outputs[0].contains("[t1] forest_tree pos=(3.00, 4.00)"));
        assert_eq!(driver.session().state(), &SessionState::Playing);
        assert_eq!(driver.session().world().entity_count(), 2);
        assert_eq!(driver.stats().warnings, 1);
        assert_eq!(driver.renderer().frames(), 3);
    }
}

//! Replays a recorded bughouse game from JSON and prints the match
//! state it reaches: both boards, reserves, clocks and the capture
//! ledger.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use shakmaty::Color;
use tracing_subscriber::EnvFilter;

use bughouse_analysis::{BoardId, RecordedGame, ReplayController};

/// Replay a recorded bughouse game and show the position it reaches.
#[derive(Parser, Debug)]
#[command(name = "bga-replay", version, about)]
struct Cli {
    /// Recorded game file (JSON).
    game: PathBuf,

    /// Stop after this many half-moves instead of replaying to the end.
    #[arg(long)]
    ply: Option<usize>,

    /// Also print thinking time per move.
    #[arg(long)]
    times: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let raw = fs::read_to_string(&cli.game)
        .with_context(|| format!("reading {}", cli.game.display()))?;
    let game: RecordedGame =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", cli.game.display()))?;

    let mut replay = ReplayController::new(&game);
    let target = cli.ply.unwrap_or(replay.len());
    replay
        .jump_to(target)
        .with_context(|| format!("replay stopped after move {}", replay.index()))?;

    println!("{} of {} half-moves replayed", replay.index(), replay.len());
    if let Some(played) = replay.last_played() {
        println!("last move: {} on board {}", played, played.board);
    }

    let snapshot = replay.snapshot();
    for id in BoardId::ALL {
        println!();
        println!("board {}  {}", id, snapshot.fen(id));
        let clocks = snapshot.clocks(id);
        println!(
            "  clocks  white {:.1?}  black {:.1?}",
            clocks.white, clocks.black
        );
        for side in [Color::White, Color::Black] {
            let held: Vec<String> = snapshot
                .reserve(id, side)
                .iter()
                .map(|(role, n)| format!("{}x{}", n, role.upper_char()))
                .collect();
            println!(
                "  {} reserve [{}]  taken {}",
                side_name(side),
                held.join(" "),
                replay.taken(id, side),
            );
        }
    }

    if cli.times {
        println!();
        println!("thinking time per move:");
        for (entry, spent) in replay.sequence().iter().zip(replay.elapsed_per_move()) {
            println!("  {} {:8} {:.1?}", entry.board, entry.text, spent);
        }
    }

    Ok(())
}

fn side_name(side: Color) -> &'static str {
    match side {
        Color::White => "white",
        Color::Black => "black",
    }
}

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, warn};
use notsoeasy::{
    action::{Action, describe_action, format_actions, parse_actions},
    history::StateManager,
    state::GameState,
};

use std::{
    io::{BufRead, IsTerminal, Write, stdin, stdout},
    path::PathBuf,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Seed for a reproducible deal
    #[arg(short, long, value_name = "SEED")]
    seed: Option<u64>,
    /// Path to a game state file to start from
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,
    /// Print the starting position and exit
    #[arg(short, long)]
    preview: bool,
    /// Log rule checks and history changes
    #[arg(short, long)]
    verbose: bool,
    /// Moves to play, e.g. `P2:P5@3 ^P2 S1:P4`
    moves: Vec<String>,
}

fn main() -> Result<()> {
    let Cli {
        seed,
        file,
        preview,
        verbose,
        moves,
    } = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if verbose {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    let mut manager = match seed {
        Some(seed) => StateManager::with_seed(seed),
        None => StateManager::new(),
    };
    match file {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let state = GameState::parse(&content).context("Failed to parse game state")?;
            if !state.is_valid() {
                warn!("{} does not hold exactly one full deck", path.display());
            }
            manager.start(state);
        }
        None => manager.init()?,
    }

    if preview {
        print_state(&manager);
        return Ok(());
    }

    if !moves.is_empty() {
        let actions = parse_actions(&moves.join(" "))?;
        for action in &actions {
            play(&mut manager, action)?;
        }
        print!("{}", format_actions(&actions));
        print_state(&manager);
        return Ok(());
    }

    if !stdin().is_terminal() {
        for line in stdin().lock().lines() {
            let line = line.context("Failed to read from stdin")?;
            if !run_command(&mut manager, line.trim())? {
                break;
            }
        }
        print_state(&manager);
        return Ok(());
    }

    print_state(&manager);
    let mut line = String::new();
    loop {
        print!("> ");
        stdout().flush()?;
        line.clear();
        if stdin().lock().read_line(&mut line)? == 0 {
            break;
        }
        match run_command(&mut manager, line.trim()) {
            Ok(true) => print_state(&manager),
            Ok(false) => break,
            Err(err) => eprintln!("{err:#}"),
        }
    }
    Ok(())
}

/// Runs one command line. Returns `false` when the session should end.
fn run_command(manager: &mut StateManager, line: &str) -> Result<bool> {
    match line {
        "" => {}
        "q" | "quit" => return Ok(false),
        "u" | "undo" => {
            if !manager.undo() {
                println!("Nothing to undo");
            }
        }
        "r" | "redo" => {
            if !manager.redo() {
                println!("Nothing to redo");
            }
        }
        "reset" => {
            manager.reset();
        }
        "n" | "new" => manager.new_game()?,
        "h" | "help" => {
            println!("Moves: P1:P3 (top card), P1:P3@2 (two cards), S2:P5 (spare), ^P4 (turn over)");
            println!("Commands: undo, redo, reset, new, quit");
        }
        _ => {
            for action in parse_actions(line)? {
                play(manager, &action)?;
            }
        }
    }
    Ok(true)
}

fn play(manager: &mut StateManager, action: &Action) -> Result<()> {
    let Some(state) = manager.current_state() else {
        bail!("No game in progress");
    };
    let description = describe_action(state, action);
    if manager.play(action)? {
        println!("✓ {description}");
    } else {
        println!("✗ {description} is not allowed");
    }
    Ok(())
}

fn print_state(manager: &StateManager) {
    let Some(state) = manager.current_state() else {
        return;
    };
    let status = if state.is_completed() {
        "Completed"
    } else if !state.is_playable() {
        "Stuck"
    } else {
        "In progress"
    };
    println!(
        r#"===== MOVE {} of {} =====
{}
Status: {status}, Undo: {}, Redo: {}"#,
        manager.cursor(),
        manager.history_len() - 1,
        state.to_pretty_string(),
        manager.can_undo(),
        manager.can_redo(),
    );
}

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use connect_four_hmm::ai::{Agent, MinimaxAgent, MinimaxSearcher};
use connect_four_hmm::config::{AppConfig, ConfigSource};
use connect_four_hmm::game::GameState;
use connect_four_hmm::hmm::{run_tracking, GridModel};
use connect_four_hmm::logging::init_logging;
use connect_four_hmm::play::{play_against_server, play_series, LocalMatchServer};

/// Connect Four search engine and HMM tracker.
#[derive(Parser)]
#[command(name = "connect_four_hmm", about = "Connect Four minimax and HMM tracking")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Override search depth
    #[arg(long, global = true)]
    depth: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play the search agent against the configured opponent
    Play {
        /// Override number of games
        #[arg(long)]
        games: Option<usize>,
    },
    /// Play one game against an in-process match server
    ServeMatch {
        /// Seed for the server's coin flip
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run the grid localization simulation
    Track {
        /// Override number of steps
        #[arg(long)]
        steps: Option<usize>,
        /// Override smoothing lag
        #[arg(long)]
        lag: Option<usize>,
    },
    /// Print the best column for a position
    BestMove {
        /// Columns played so far, e.g. "3324"
        #[arg(default_value = "")]
        moves: String,
    },
    /// Print the default configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, source) = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(depth) = cli.depth {
        config.search.max_depth = depth;
    }
    config.validate().context("invalid configuration")?;
    init_logging(&config.logging);
    if source == ConfigSource::Defaults {
        warn!(path = %cli.config.display(), "config file not found, using defaults");
    }

    match cli.command {
        Command::Play { games } => play(&config, games.unwrap_or(config.play.games)),
        Command::ServeMatch { seed } => serve_match(&config, seed.unwrap_or(config.play.seed)),
        Command::Track { steps, lag } => track(
            &config,
            steps.unwrap_or(config.tracker.steps),
            lag.unwrap_or(config.tracker.lag),
        ),
        Command::BestMove { moves } => best_move(&config, &moves),
        Command::Config => {
            print!("{}", AppConfig::default_toml().context("serializing default config")?);
            Ok(())
        }
    }
}

fn play(config: &AppConfig, games: usize) -> Result<()> {
    let mut agent = MinimaxAgent::from_config(config.search.clone());
    let mut opponent = config.play.opponent(0);
    info!(games, opponent = opponent.name(), "starting series");

    let summary = play_series(&mut agent, opponent.as_mut(), games).context("playing series")?;
    println!(
        "{} games: {} wins, {} losses, {} draws, {} forfeits (win rate {:.1}%, reward {:.1})",
        summary.games(),
        summary.wins,
        summary.losses,
        summary.draws,
        summary.forfeits,
        summary.win_rate() * 100.0,
        summary.total_reward
    );
    Ok(())
}

fn serve_match(config: &AppConfig, seed: u64) -> Result<()> {
    let mut agent = MinimaxAgent::from_config(config.search.clone());
    let mut server = LocalMatchServer::new(config.play.opponent(seed), seed);
    let report = play_against_server(&mut agent, &mut server).context("playing against server")?;
    println!("{}", report.final_board);
    println!("result {} after {} moves", report.result, report.client_moves);
    Ok(())
}

fn track(config: &AppConfig, steps: usize, lag: usize) -> Result<()> {
    if steps == 0 || lag == 0 {
        bail!("steps and lag must be at least 1");
    }
    let model = GridModel::new(config.tracker.rows, config.tracker.cols)
        .context("building grid model")?;
    let report = run_tracking(&model, steps, lag, config.tracker.seed).context("tracking")?;
    println!(
        "{}x{} grid, {} steps, lag {}",
        model.rows(),
        model.cols(),
        report.steps,
        lag
    );
    println!("filtered error:  {:.3}", report.filtered_error);
    println!(
        "smoothed error:  {:.3} over {} steps",
        report.smoothed_error, report.smoothed_steps
    );
    println!("uniform guess:   {:.3}", report.uniform_guess_error);
    println!("nothing readings: {}", report.nothing_readings);
    Ok(())
}

fn best_move(config: &AppConfig, moves: &str) -> Result<()> {
    let columns = moves
        .chars()
        .map(|c| {
            c.to_digit(10)
                .map(|d| d as usize)
                .with_context(|| format!("'{c}' is not a column digit"))
        })
        .collect::<Result<Vec<_>>>()?;
    let state = GameState::from_moves(&columns).context("replaying moves")?;

    let searcher = MinimaxSearcher::from_config(&config.search);
    let outcome = searcher
        .search(state.board(), state.current_player())
        .context("searching position")?;

    println!("{}", state.board());
    println!(
        "{} plays column {} (score {}, depth {}, {} nodes{})",
        state.current_player().name(),
        outcome.column,
        outcome.score,
        outcome.depth_reached,
        outcome.nodes,
        if outcome.cut_off { ", cut off" } else { "" }
    );
    Ok(())
}

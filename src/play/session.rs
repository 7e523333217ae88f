use tracing::{info, warn};

use crate::ai::Agent;
use crate::error::{MatchError, MoveError};
use crate::game::{GameOutcome, GameState, Player, ILLEGAL_MOVE_REWARD};

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchResult {
    Finished(GameOutcome),
    /// `player` chose a full or nonexistent column and lost.
    Forfeit { player: Player, column: usize },
}

impl MatchResult {
    pub fn winner(&self) -> Option<Player> {
        match *self {
            MatchResult::Finished(GameOutcome::Winner(p)) => Some(p),
            MatchResult::Finished(GameOutcome::Draw) => None,
            MatchResult::Forfeit { player, .. } => Some(player.other()),
        }
    }

    /// Final reward from `player`'s point of view.
    pub fn reward_for(&self, player: Player) -> f64 {
        match *self {
            MatchResult::Finished(outcome) => outcome.reward_for(player),
            MatchResult::Forfeit { player: loser, .. } if loser == player => ILLEGAL_MOVE_REWARD,
            MatchResult::Forfeit { .. } => GameOutcome::Winner(player).reward_for(player),
        }
    }
}

/// Record of one finished game.
#[derive(Debug, Clone)]
pub struct MatchReport {
    pub result: MatchResult,
    pub moves: Vec<usize>,
    pub final_state: GameState,
}

impl MatchReport {
    pub fn reward_for(&self, player: Player) -> f64 {
        self.result.reward_for(player)
    }
}

/// Play one game to completion. `first` moves first as [`Player::A`].
pub fn play_match(first: &mut dyn Agent, second: &mut dyn Agent) -> Result<MatchReport, MatchError> {
    let mut state = GameState::initial();
    let mut moves = Vec::new();

    let result = loop {
        if let Some(outcome) = state.outcome() {
            break MatchResult::Finished(outcome);
        }

        let player = state.current_player();
        let agent: &mut dyn Agent = match player {
            Player::A => &mut *first,
            Player::B => &mut *second,
        };
        let column = agent.select_action(&state)?;

        match state.apply_move(column) {
            Ok(next) => {
                moves.push(column);
                state = next;
            }
            Err(MoveError::ColumnFull(_) | MoveError::InvalidColumn(_)) => {
                warn!(agent = agent.name(), column, "illegal move, forfeiting");
                break MatchResult::Forfeit { player, column };
            }
            Err(e) => return Err(e.into()),
        }
    };

    info!(
        first = first.name(),
        second = second.name(),
        moves = moves.len(),
        winner = result.winner().map(Player::name),
        "match finished"
    );
    Ok(MatchReport {
        result,
        moves,
        final_state: state,
    })
}

/// Tally of a series of games from one agent's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeriesSummary {
    pub wins: usize,
    pub losses: usize,
    pub draws: usize,
    pub forfeits: usize,
    pub total_reward: f64,
}

impl SeriesSummary {
    pub fn record(&mut self, report: &MatchReport, me: Player) {
        match report.result {
            MatchResult::Forfeit { player, .. } if player == me => self.forfeits += 1,
            _ => match report.result.winner() {
                Some(winner) if winner == me => self.wins += 1,
                Some(_) => self.losses += 1,
                None => self.draws += 1,
            },
        }
        self.total_reward += report.reward_for(me);
    }

    pub fn games(&self) -> usize {
        self.wins + self.losses + self.draws + self.forfeits
    }

    pub fn win_rate(&self) -> f64 {
        if self.games() == 0 {
            0.0
        } else {
            self.wins as f64 / self.games() as f64
        }
    }
}

/// Play `games` games, alternating who moves first. Returns the summary
/// from `agent`'s point of view.
pub fn play_series(
    agent: &mut dyn Agent,
    opponent: &mut dyn Agent,
    games: usize,
) -> Result<SeriesSummary, MatchError> {
    let mut summary = SeriesSummary::default();
    for game in 0..games {
        let (report, me) = if game % 2 == 0 {
            (play_match(agent, opponent)?, Player::A)
        } else {
            (play_match(opponent, agent)?, Player::B)
        };
        summary.record(&report, me);
    }
    Ok(summary)
}

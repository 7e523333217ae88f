use super::{Board, Player};
use crate::error::MoveError;

/// Reward for winning a game, seen by the winner.
pub const WIN_REWARD: f64 = 1.0;
/// Reward for a drawn game, seen by both sides.
pub const DRAW_REWARD: f64 = 0.5;
/// Reward for losing a game.
pub const LOSS_REWARD: f64 = -1.0;
/// Reward for playing into a full or nonexistent column, which forfeits.
pub const ILLEGAL_MOVE_REWARD: f64 = -10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Winner(Player),
    Draw,
}

impl GameOutcome {
    /// Final reward from `player`'s point of view.
    pub fn reward_for(self, player: Player) -> f64 {
        match self {
            GameOutcome::Winner(winner) if winner == player => WIN_REWARD,
            GameOutcome::Winner(_) => LOSS_REWARD,
            GameOutcome::Draw => DRAW_REWARD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameState {
    board: Board,
    current_player: Player,
    outcome: Option<GameOutcome>,
}

impl GameState {
    /// Create initial game state
    pub fn initial() -> Self {
        GameState {
            board: Board::new(),
            current_player: Player::A,
            outcome: None,
        }
    }

    /// Resume from an arbitrary position with `to_move` next.
    pub fn from_board(board: Board, to_move: Player) -> Self {
        let outcome = match board.winner() {
            Some(winner) => Some(GameOutcome::Winner(winner)),
            None if board.is_full() => Some(GameOutcome::Draw),
            None => None,
        };
        GameState {
            board,
            current_player: to_move,
            outcome,
        }
    }

    /// Get current player
    pub fn current_player(&self) -> Player {
        self.current_player
    }

    /// Get reference to board
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Get game outcome if game is over
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// Check if game is over
    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    /// Get list of legal columns (not full)
    pub fn legal_actions(&self) -> Vec<usize> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.board.available_moves()
    }

    /// Apply a move and return new state (immutable)
    pub fn apply_move(&self, column: usize) -> Result<GameState, MoveError> {
        if self.is_terminal() {
            return Err(MoveError::GameOver);
        }

        let result = self.board.apply_move(column, self.current_player)?;
        let outcome = if !result.terminal {
            None
        } else if result.board.winner().is_some() {
            Some(GameOutcome::Winner(self.current_player))
        } else {
            Some(GameOutcome::Draw)
        };

        Ok(GameState {
            board: result.board,
            current_player: self.current_player.other(),
            outcome,
        })
    }

    /// Replay a sequence of columns from the initial position.
    pub fn from_moves(moves: &[usize]) -> Result<GameState, MoveError> {
        moves
            .iter()
            .try_fold(GameState::initial(), |state, &col| state.apply_move(col))
    }
}

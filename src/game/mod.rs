//! Core Connect Four game logic: board representation, player types, and game
//! state machine with immutable transitions.

mod board;
mod player;
mod state;

pub use crate::error::MoveError;
pub use board::{Board, Cell, MoveResult, CENTER_COL, COLS, ROWS, WINDOWS, WINDOW_COUNT};
pub use player::Player;
pub use state::{
    GameOutcome, GameState, DRAW_REWARD, ILLEGAL_MOVE_REWARD, LOSS_REWARD, WIN_REWARD,
};

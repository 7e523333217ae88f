//! Game search engine: static evaluation, depth-limited minimax with
//! alpha-beta pruning, and the agents built on top of it.

mod agent;
pub mod heuristic;
pub mod minimax;
mod random;

pub use agent::Agent;
pub use heuristic::{evaluate, ConnectFourHeuristic, Heuristic};
pub use minimax::{
    choose_move, MinimaxAgent, MinimaxSearcher, MoveOrder, SearchBudget, SearchConfig,
    SearchOutcome, WIN_SCORE,
};
pub use random::RandomAgent;

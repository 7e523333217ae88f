use crate::error::SearchError;
use crate::game::GameState;

/// Universal interface for Connect Four agents.
pub trait Agent {
    /// Select an action (column) given the current game state.
    /// Fails with [`SearchError::NoLegalMove`] when the game is over or the
    /// board is full.
    fn select_action(&mut self, state: &GameState) -> Result<usize, SearchError>;

    /// Return the agent's display name.
    fn name(&self) -> &str;
}

impl<A: Agent + ?Sized> Agent for Box<A> {
    fn select_action(&mut self, state: &GameState) -> Result<usize, SearchError> {
        (**self).select_action(state)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

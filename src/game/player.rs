use super::board::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    A,
    B,
}

impl Player {
    /// Get the other player
    pub fn other(self) -> Player {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }

    /// Convert player to cell type
    pub fn to_cell(self) -> Cell {
        match self {
            Player::A => Cell::PlayerA,
            Player::B => Cell::PlayerB,
        }
    }

    /// Get player name for display
    pub fn name(self) -> &'static str {
        match self {
            Player::A => "Player A",
            Player::B => "Player B",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_player() {
        assert_eq!(Player::A.other(), Player::B);
        assert_eq!(Player::B.other(), Player::A);
    }

    #[test]
    fn test_cell_roundtrip() {
        assert_eq!(Player::A.to_cell().player(), Some(Player::A));
        assert_eq!(Player::B.to_cell().player(), Some(Player::B));
        assert_eq!(Cell::Empty.player(), None);
    }

    #[test]
    fn test_player_name() {
        assert_eq!(Player::A.name(), "Player A");
        assert_eq!(Player::B.name(), "Player B");
    }
}

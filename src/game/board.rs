use std::fmt;

use super::player::Player;
use crate::error::MoveError;

pub const ROWS: usize = 6;
pub const COLS: usize = 7;
pub const CENTER_COL: usize = COLS / 2;

/// Number of distinct 4-cell windows on a 6x7 board.
pub const WINDOW_COUNT: usize = 69;

/// Every horizontal, vertical and diagonal 4-cell window as (row, col) pairs.
/// Row 0 is the top.
pub static WINDOWS: [[(usize, usize); 4]; WINDOW_COUNT] = build_windows();

const fn build_windows() -> [[(usize, usize); 4]; WINDOW_COUNT] {
    let mut out = [[(0, 0); 4]; WINDOW_COUNT];
    let mut n = 0;

    // Horizontal
    let mut row = 0;
    while row < ROWS {
        let mut col = 0;
        while col + 3 < COLS {
            let mut i = 0;
            while i < 4 {
                out[n][i] = (row, col + i);
                i += 1;
            }
            n += 1;
            col += 1;
        }
        row += 1;
    }

    // Vertical
    let mut col = 0;
    while col < COLS {
        let mut row = 0;
        while row + 3 < ROWS {
            let mut i = 0;
            while i < 4 {
                out[n][i] = (row + i, col);
                i += 1;
            }
            n += 1;
            row += 1;
        }
        col += 1;
    }

    // Diagonal (top-left to bottom-right, \)
    let mut row = 0;
    while row + 3 < ROWS {
        let mut col = 0;
        while col + 3 < COLS {
            let mut i = 0;
            while i < 4 {
                out[n][i] = (row + i, col + i);
                i += 1;
            }
            n += 1;
            col += 1;
        }
        row += 1;
    }

    // Diagonal (bottom-left to top-right, /)
    let mut row = 3;
    while row < ROWS {
        let mut col = 0;
        while col + 3 < COLS {
            let mut i = 0;
            while i < 4 {
                out[n][i] = (row - i, col + i);
                i += 1;
            }
            n += 1;
            col += 1;
        }
        row += 1;
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    PlayerA,
    PlayerB,
}

impl Cell {
    /// Owner of a non-empty cell.
    pub fn player(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::PlayerA => Some(Player::A),
            Cell::PlayerB => Some(Player::B),
        }
    }
}

/// Result of dropping a disc: the new board plus the reward and terminal
/// flag from the mover's point of view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveResult {
    pub board: Board,
    /// 1.0 for a win, 0.5 for a draw, 0.0 while the game runs.
    pub reward: f64,
    pub terminal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Cell; COLS]; ROWS],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Board {
            cells: [[Cell::Empty; COLS]; ROWS],
        }
    }

    /// Build a board from a signed grid where `1` marks `me`'s discs, `-1`
    /// the opponent's and `0` empty cells. Row 0 is the top.
    pub fn from_grid(grid: &[[i8; COLS]; ROWS], me: Player) -> Result<Self, MoveError> {
        let mut board = Board::new();
        for (row, values) in grid.iter().enumerate() {
            for (col, &value) in values.iter().enumerate() {
                board.cells[row][col] = match value {
                    0 => Cell::Empty,
                    1 => me.to_cell(),
                    -1 => me.other().to_cell(),
                    _ => return Err(MoveError::InvalidCell { row, col, value }),
                };
            }
        }

        for col in 0..COLS {
            for row in 0..ROWS - 1 {
                if board.cells[row][col] != Cell::Empty && board.cells[row + 1][col] == Cell::Empty
                {
                    return Err(MoveError::FloatingDisc { row, col });
                }
            }
        }

        Ok(board)
    }

    /// Signed grid from `me`'s point of view; inverse of [`Board::from_grid`].
    pub fn to_grid(&self, me: Player) -> [[i8; COLS]; ROWS] {
        let mut grid = [[0i8; COLS]; ROWS];
        for row in 0..ROWS {
            for col in 0..COLS {
                grid[row][col] = match self.cells[row][col].player() {
                    None => 0,
                    Some(p) if p == me => 1,
                    Some(_) => -1,
                };
            }
        }
        grid
    }

    /// Get the cell at a specific position
    /// Row 0 is the top, row 5 is the bottom
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    /// Check if a column is full
    pub fn is_column_full(&self, col: usize) -> bool {
        if col >= COLS {
            return true;
        }
        self.cells[0][col] != Cell::Empty
    }

    /// Columns that still have room, in ascending order.
    pub fn available_moves(&self) -> Vec<usize> {
        (0..COLS).filter(|&col| !self.is_column_full(col)).collect()
    }

    /// Number of discs on the board.
    pub fn disc_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&c| c != Cell::Empty)
            .count()
    }

    /// Drop a piece in a column, returns the row where it landed
    pub fn drop_piece(&mut self, col: usize, cell: Cell) -> Result<usize, MoveError> {
        if col >= COLS {
            return Err(MoveError::InvalidColumn(col));
        }

        if self.is_column_full(col) {
            return Err(MoveError::ColumnFull(col));
        }

        let row = (0..ROWS)
            .rev()
            .find(|&row| self.cells[row][col] == Cell::Empty)
            .ok_or(MoveError::ColumnFull(col))?;
        self.cells[row][col] = cell;
        Ok(row)
    }

    /// Drop `player`'s disc into `col` on a copy of this board.
    pub fn apply_move(&self, col: usize, player: Player) -> Result<MoveResult, MoveError> {
        let mut board = *self;
        let row = board.drop_piece(col, player.to_cell())?;

        let (reward, terminal) = if board.check_win(row, col) {
            (1.0, true)
        } else if board.is_full() {
            (0.5, true)
        } else {
            (0.0, false)
        };

        Ok(MoveResult {
            board,
            reward,
            terminal,
        })
    }

    /// Check if the board is completely full
    pub fn is_full(&self) -> bool {
        (0..COLS).all(|col| self.is_column_full(col))
    }

    /// Owner of any four-in-a-row on the board.
    pub fn winner(&self) -> Option<Player> {
        WINDOWS.iter().find_map(|window| {
            let (r0, c0) = window[0];
            let first = self.cells[r0][c0];
            if first != Cell::Empty && window.iter().all(|&(r, c)| self.cells[r][c] == first) {
                first.player()
            } else {
                None
            }
        })
    }

    /// True if either player has four in a row anywhere on the board.
    pub fn is_win_state(&self) -> bool {
        self.winner().is_some()
    }

    /// True if the position is won or the grid is full.
    pub fn is_terminal(&self) -> bool {
        self.is_win_state() || self.is_full()
    }

    /// Check if the last move at (row, col) resulted in a win
    pub fn check_win(&self, row: usize, col: usize) -> bool {
        let cell = self.get(row, col);
        if cell == Cell::Empty {
            return false;
        }

        // (dr, dc) pairs: horizontal, vertical, diagonal /, diagonal \
        [(0, 1), (1, 0), (1, -1), (1, 1)]
            .iter()
            .any(|&(dr, dc)| {
                1 + self.run_length(row, col, dr, dc, cell) + self.run_length(row, col, -dr, -dc, cell)
                    >= 4
            })
    }

    /// Count consecutive `cell`s starting next to (row, col) in direction (dr, dc).
    fn run_length(&self, row: usize, col: usize, dr: i32, dc: i32, cell: Cell) -> usize {
        let mut count = 0;
        let mut r = row as i32 + dr;
        let mut c = col as i32 + dc;
        while (0..ROWS as i32).contains(&r)
            && (0..COLS as i32).contains(&c)
            && self.cells[r as usize][c as usize] == cell
        {
            count += 1;
            r += dr;
            c += dc;
        }
        count
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in row {
                let ch = match cell {
                    Cell::Empty => '.',
                    Cell::PlayerA => 'A',
                    Cell::PlayerB => 'B',
                };
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new();
        for row in 0..ROWS {
            for col in 0..COLS {
                assert_eq!(board.get(row, col), Cell::Empty);
            }
        }
        assert_eq!(board.available_moves(), vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_windows_are_distinct_and_in_bounds() {
        let mut seen = std::collections::HashSet::new();
        for window in WINDOWS.iter() {
            for &(r, c) in window {
                assert!(r < ROWS && c < COLS);
            }
            let mut key = *window;
            key.sort();
            assert!(seen.insert(key), "duplicate window {window:?}");
        }
        assert_eq!(seen.len(), WINDOW_COUNT);
    }

    #[test]
    fn test_drop_piece() {
        let mut board = Board::new();

        let row = board.drop_piece(3, Cell::PlayerA).unwrap();
        assert_eq!(row, 5);
        assert_eq!(board.get(5, 3), Cell::PlayerA);

        let row = board.drop_piece(3, Cell::PlayerB).unwrap();
        assert_eq!(row, 4);
        assert_eq!(board.get(4, 3), Cell::PlayerB);
    }

    #[test]
    fn test_column_full() {
        let mut board = Board::new();
        for _ in 0..ROWS {
            board.drop_piece(0, Cell::PlayerA).unwrap();
        }

        assert!(board.is_column_full(0));
        assert_eq!(
            board.drop_piece(0, Cell::PlayerB),
            Err(MoveError::ColumnFull(0))
        );
        assert!(!board.available_moves().contains(&0));
    }

    #[test]
    fn test_invalid_column() {
        let mut board = Board::new();
        assert_eq!(
            board.drop_piece(7, Cell::PlayerA),
            Err(MoveError::InvalidColumn(7))
        );
    }

    #[test]
    fn test_apply_move_leaves_original_untouched() {
        let board = Board::new();
        let result = board.apply_move(2, Player::A).unwrap();
        assert_eq!(board, Board::new());
        assert_eq!(result.board.get(5, 2), Cell::PlayerA);
        assert!(!result.terminal);
        assert_eq!(result.reward, 0.0);
    }

    #[test]
    fn test_apply_move_reports_win() {
        let mut board = Board::new();
        for col in 0..3 {
            board.drop_piece(col, Cell::PlayerB).unwrap();
        }
        let result = board.apply_move(3, Player::B).unwrap();
        assert!(result.terminal);
        assert_eq!(result.reward, 1.0);
        assert_eq!(result.board.winner(), Some(Player::B));
    }

    #[test]
    fn test_full_board() {
        let mut board = Board::new();
        for col in 0..COLS {
            for _ in 0..ROWS {
                board.drop_piece(col, Cell::PlayerA).unwrap();
            }
        }
        assert!(board.is_full());
        assert!(board.available_moves().is_empty());
        assert!(board.is_terminal());
    }

    #[test]
    fn test_horizontal_win() {
        let mut board = Board::new();
        for col in 0..4 {
            board.drop_piece(col, Cell::PlayerA).unwrap();
        }
        assert!(board.check_win(5, 2));
        assert_eq!(board.winner(), Some(Player::A));
    }

    #[test]
    fn test_vertical_win() {
        let mut board = Board::new();
        for _ in 0..4 {
            board.drop_piece(3, Cell::PlayerB).unwrap();
        }
        assert!(board.check_win(2, 3));
        assert!(board.is_win_state());
    }

    #[test]
    fn test_diagonal_up_win() {
        let mut board = Board::new();
        board.drop_piece(0, Cell::PlayerA).unwrap();

        board.drop_piece(1, Cell::PlayerB).unwrap();
        board.drop_piece(1, Cell::PlayerA).unwrap();

        board.drop_piece(2, Cell::PlayerB).unwrap();
        board.drop_piece(2, Cell::PlayerB).unwrap();
        board.drop_piece(2, Cell::PlayerA).unwrap();

        board.drop_piece(3, Cell::PlayerB).unwrap();
        board.drop_piece(3, Cell::PlayerB).unwrap();
        board.drop_piece(3, Cell::PlayerB).unwrap();
        let row = board.drop_piece(3, Cell::PlayerA).unwrap();

        assert!(board.check_win(row, 3));
        assert_eq!(board.winner(), Some(Player::A));
    }

    #[test]
    fn test_diagonal_down_win() {
        let mut board = Board::new();
        board.drop_piece(6, Cell::PlayerA).unwrap();

        board.drop_piece(5, Cell::PlayerB).unwrap();
        board.drop_piece(5, Cell::PlayerA).unwrap();

        board.drop_piece(4, Cell::PlayerB).unwrap();
        board.drop_piece(4, Cell::PlayerB).unwrap();
        board.drop_piece(4, Cell::PlayerA).unwrap();

        board.drop_piece(3, Cell::PlayerB).unwrap();
        board.drop_piece(3, Cell::PlayerB).unwrap();
        board.drop_piece(3, Cell::PlayerB).unwrap();
        let row = board.drop_piece(3, Cell::PlayerA).unwrap();

        assert!(board.check_win(row, 3));
        assert_eq!(board.winner(), Some(Player::A));
    }

    #[test]
    fn test_no_win_with_three() {
        let mut board = Board::new();
        for col in 0..3 {
            board.drop_piece(col, Cell::PlayerA).unwrap();
        }
        assert!(!board.check_win(5, 1));
        assert_eq!(board.winner(), None);
    }

    #[test]
    fn test_grid_roundtrip_from_each_side() {
        let mut board = Board::new();
        board.drop_piece(3, Cell::PlayerA).unwrap();
        board.drop_piece(3, Cell::PlayerB).unwrap();
        board.drop_piece(0, Cell::PlayerB).unwrap();

        let grid = board.to_grid(Player::B);
        assert_eq!(grid[5][3], -1);
        assert_eq!(grid[4][3], 1);
        assert_eq!(grid[5][0], 1);
        assert_eq!(Board::from_grid(&grid, Player::B).unwrap(), board);
    }

    #[test]
    fn test_from_grid_rejects_floating_disc() {
        let mut grid = [[0i8; COLS]; ROWS];
        grid[3][2] = 1;
        assert_eq!(
            Board::from_grid(&grid, Player::A),
            Err(MoveError::FloatingDisc { row: 3, col: 2 })
        );
    }

    #[test]
    fn test_from_grid_rejects_bad_value() {
        let mut grid = [[0i8; COLS]; ROWS];
        grid[5][6] = 2;
        assert_eq!(
            Board::from_grid(&grid, Player::A),
            Err(MoveError::InvalidCell {
                row: 5,
                col: 6,
                value: 2
            })
        );
    }

    #[test]
    fn test_display() {
        let mut board = Board::new();
        board.drop_piece(0, Cell::PlayerA).unwrap();
        board.drop_piece(6, Cell::PlayerB).unwrap();
        let text = board.to_string();
        assert_eq!(text.lines().count(), ROWS);
        assert_eq!(text.lines().last(), Some("A.....B"));
    }
}

use crate::game::{Board, Cell, Player, CENTER_COL, ROWS, WINDOWS};

/// Window holding four of one player's discs.
pub const FOUR_SCORE: f64 = 100_000.0;
/// Three discs plus one empty cell.
pub const THREE_SCORE: f64 = 100.0;
/// Two discs plus two empty cells.
pub const TWO_SCORE: f64 = 10.0;
/// Per disc in the center column.
pub const CENTER_SCORE: f64 = 3.0;

/// Trait for evaluating a board position from a player's perspective.
pub trait Heuristic: Send + Sync {
    fn evaluate(&self, board: &Board, player: Player) -> f64;
}

/// Default heuristic that scans all 4-cell windows and scores threats.
///
/// Magnitudes are symmetric, so swapping the perspective negates the score.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectFourHeuristic;

impl ConnectFourHeuristic {
    fn score_window(own: usize, opp: usize, empty: usize) -> f64 {
        match (own, opp, empty) {
            (4, 0, 0) => FOUR_SCORE,
            (0, 4, 0) => -FOUR_SCORE,
            (3, 0, 1) => THREE_SCORE,
            (0, 3, 1) => -THREE_SCORE,
            (2, 0, 2) => TWO_SCORE,
            (0, 2, 2) => -TWO_SCORE,
            _ => 0.0,
        }
    }
}

impl Heuristic for ConnectFourHeuristic {
    fn evaluate(&self, board: &Board, player: Player) -> f64 {
        let own_cell = player.to_cell();
        let mut score = 0.0;

        for row in 0..ROWS {
            match board.get(row, CENTER_COL) {
                Cell::Empty => {}
                c if c == own_cell => score += CENTER_SCORE,
                _ => score -= CENTER_SCORE,
            }
        }

        for window in WINDOWS.iter() {
            let mut own = 0;
            let mut opp = 0;
            let mut empty = 0;
            for &(row, col) in window {
                match board.get(row, col) {
                    Cell::Empty => empty += 1,
                    c if c == own_cell => own += 1,
                    _ => opp += 1,
                }
            }
            score += Self::score_window(own, opp, empty);
        }

        score
    }
}

/// Static evaluation with the default weights.
pub fn evaluate(board: &Board, player: Player) -> f64 {
    ConnectFourHeuristic.evaluate(board, player)
}

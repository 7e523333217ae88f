//! Robot localization on a rectangular grid.
//!
//! The hidden state is the robot's cell and heading. The robot keeps its
//! heading with probability [`P_KEEP_HEADING`] unless it faces a wall, then
//! moves one cell. The sensor reports the true cell, a nearby cell, or
//! nothing.

use ndarray::{Array1, Array2, ArrayView1};

use super::model::{HiddenMarkovModel, MatrixModel, Reading};
use crate::error::FilterError;

pub const P_KEEP_HEADING: f64 = 0.7;
pub const P_TRUE_CELL: f64 = 0.1;
/// Per cell at Chebyshev distance 1.
pub const P_FIRST_RING: f64 = 0.05;
/// Per cell at Chebyshev distance 2.
pub const P_SECOND_RING: f64 = 0.025;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heading {
    North,
    East,
    South,
    West,
}

impl Heading {
    pub const ALL: [Heading; 4] = [Heading::North, Heading::East, Heading::South, Heading::West];

    fn delta(self) -> (isize, isize) {
        match self {
            Heading::North => (-1, 0),
            Heading::East => (0, 1),
            Heading::South => (1, 0),
            Heading::West => (0, -1),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Geometry {
    rows: usize,
    cols: usize,
}

impl Geometry {
    fn state_index(self, row: usize, col: usize, heading: Heading) -> usize {
        (row * self.cols + col) * 4 + heading.index()
    }

    /// Neighbouring cell in `heading`, or `None` at a wall.
    fn step(self, row: usize, col: usize, heading: Heading) -> Option<(usize, usize)> {
        let (dr, dc) = heading.delta();
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        (r < self.rows && c < self.cols).then_some((r, c))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridModel {
    geometry: Geometry,
    matrices: MatrixModel,
}

impl GridModel {
    pub fn new(rows: usize, cols: usize) -> Result<Self, FilterError> {
        if rows < 2 || cols < 2 {
            return Err(FilterError::InvalidModel(format!(
                "grid must be at least 2x2, got {rows}x{cols}"
            )));
        }
        let geometry = Geometry { rows, cols };
        let transition = build_transition(geometry);
        let observations = build_observations(geometry);
        let matrices = MatrixModel::new(transition, &observations)?;
        Ok(GridModel { geometry, matrices })
    }

    pub fn rows(&self) -> usize {
        self.geometry.rows
    }

    pub fn cols(&self) -> usize {
        self.geometry.cols
    }

    pub fn cell_count(&self) -> usize {
        self.rows() * self.cols()
    }

    pub fn state_index(&self, row: usize, col: usize, heading: Heading) -> usize {
        self.geometry.state_index(row, col, heading)
    }

    /// Cell `(row, col)` of a state.
    pub fn state_cell(&self, state: usize) -> (usize, usize) {
        let cell = state / 4;
        (cell / self.cols(), cell % self.cols())
    }

    pub fn cell_reading(&self, row: usize, col: usize) -> Reading {
        Reading(row * self.cols() + col)
    }

    /// The reading emitted when the sensor reports nothing.
    pub fn nothing_reading(&self) -> Reading {
        Reading(self.cell_count())
    }

    /// Cell reported by a reading, or `None` for the nothing reading.
    pub fn reading_cell(&self, reading: Reading) -> Option<(usize, usize)> {
        let cols = self.cols();
        (reading.0 < self.cell_count()).then(|| (reading.0 / cols, reading.0 % cols))
    }

    /// Observation probabilities, one row per reading.
    pub fn observations(&self) -> &Array2<f64> {
        self.matrices.observations()
    }

    /// Marginal probability of each cell, summing out the heading.
    pub fn cell_distribution(&self, belief: &Array1<f64>) -> Array1<f64> {
        Array1::from_iter(belief.exact_chunks(4).into_iter().map(|headings| headings.sum()))
    }

    /// Most probable cell under `belief`. Ties go to the lowest index.
    pub fn most_likely_cell(&self, belief: &Array1<f64>) -> (usize, usize) {
        let cells = self.cell_distribution(belief);
        let mut best = 0;
        for (i, &p) in cells.iter().enumerate() {
            if p > cells[best] {
                best = i;
            }
        }
        (best / self.cols(), best % self.cols())
    }

    /// Mean Manhattan distance between two independent uniform cells.
    pub fn uniform_guess_error(&self) -> f64 {
        let axis = |n: usize| {
            let n = n as f64;
            (n * n - 1.0) / (3.0 * n)
        };
        axis(self.rows()) + axis(self.cols())
    }
}

impl HiddenMarkovModel for GridModel {
    fn state_count(&self) -> usize {
        self.matrices.state_count()
    }

    fn reading_count(&self) -> usize {
        self.matrices.reading_count()
    }

    fn transition_matrix(&self) -> &Array2<f64> {
        self.matrices.transition_matrix()
    }

    fn transposed_transition_matrix(&self) -> &Array2<f64> {
        self.matrices.transposed_transition_matrix()
    }

    fn observation_vector(&self, reading: Reading) -> Result<ArrayView1<'_, f64>, FilterError> {
        self.matrices.observation_vector(reading)
    }
}

fn build_transition(geometry: Geometry) -> Array2<f64> {
    let Geometry { rows, cols } = geometry;
    let states = rows * cols * 4;
    let mut transition = Array2::zeros((states, states));

    for row in 0..rows {
        for col in 0..cols {
            let open: Vec<Heading> = Heading::ALL
                .into_iter()
                .filter(|&h| geometry.step(row, col, h).is_some())
                .collect();

            for heading in Heading::ALL {
                let from = geometry.state_index(row, col, heading);
                for &next in &open {
                    let p = if !open.contains(&heading) {
                        1.0 / open.len() as f64
                    } else if next == heading {
                        P_KEEP_HEADING
                    } else {
                        (1.0 - P_KEEP_HEADING) / (open.len() - 1) as f64
                    };
                    if let Some((r, c)) = geometry.step(row, col, next) {
                        transition[[geometry.state_index(r, c, next), from]] += p;
                    }
                }
            }
        }
    }

    transition
}

fn build_observations(geometry: Geometry) -> Vec<Array1<f64>> {
    let Geometry { rows, cols } = geometry;
    let cells = rows * cols;
    let states = cells * 4;
    let mut observations = vec![Array1::zeros(states); cells + 1];

    for row in 0..rows {
        for col in 0..cols {
            let mut reported = 0.0;
            for r in 0..rows {
                for c in 0..cols {
                    let p = match row.abs_diff(r).max(col.abs_diff(c)) {
                        0 => P_TRUE_CELL,
                        1 => P_FIRST_RING,
                        2 => P_SECOND_RING,
                        _ => continue,
                    };
                    reported += p;
                    for heading in 0..4 {
                        observations[r * cols + c][(row * cols + col) * 4 + heading] = p;
                    }
                }
            }
            for heading in 0..4 {
                observations[cells][(row * cols + col) * 4 + heading] = 1.0 - reported;
            }
        }
    }

    observations
}

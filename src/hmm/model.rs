use ndarray::{Array1, Array2, ArrayView1};

use crate::error::FilterError;

/// Tolerance for "columns sum to one".
const STOCHASTIC_TOLERANCE: f64 = 1e-9;

/// Index of a sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reading(pub usize);

/// Transition and observation model consumed by the filter.
///
/// `T[i][j] = P(next = i | current = j)`. The observation matrix for a
/// reading is diagonal, so it is also exposed as its diagonal vector.
pub trait HiddenMarkovModel {
    fn state_count(&self) -> usize;

    fn reading_count(&self) -> usize;

    fn transition_matrix(&self) -> &Array2<f64>;

    fn transposed_transition_matrix(&self) -> &Array2<f64>;

    /// Diagonal of `O_reading`: entry `i` is `P(reading | state = i)`.
    fn observation_vector(&self, reading: Reading) -> Result<ArrayView1<'_, f64>, FilterError>;

    /// `O_reading` as a full diagonal matrix.
    fn observation_matrix(&self, reading: Reading) -> Result<Array2<f64>, FilterError> {
        Ok(Array2::from_diag(&self.observation_vector(reading)?))
    }
}

impl<M: HiddenMarkovModel + ?Sized> HiddenMarkovModel for &M {
    fn state_count(&self) -> usize {
        (**self).state_count()
    }

    fn reading_count(&self) -> usize {
        (**self).reading_count()
    }

    fn transition_matrix(&self) -> &Array2<f64> {
        (**self).transition_matrix()
    }

    fn transposed_transition_matrix(&self) -> &Array2<f64> {
        (**self).transposed_transition_matrix()
    }

    fn observation_vector(&self, reading: Reading) -> Result<ArrayView1<'_, f64>, FilterError> {
        (**self).observation_vector(reading)
    }
}

/// Model backed by explicit matrices, validated on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixModel {
    transition: Array2<f64>,
    transposed: Array2<f64>,
    /// One row per reading, one column per state.
    observations: Array2<f64>,
}

impl MatrixModel {
    pub fn new(
        transition: Array2<f64>,
        observations: &[Array1<f64>],
    ) -> Result<Self, FilterError> {
        let (rows, cols) = transition.dim();
        if rows == 0 || rows != cols {
            return Err(FilterError::InvalidModel(format!(
                "transition matrix must be square and non-empty, got {rows}x{cols}"
            )));
        }
        if transition.iter().any(|&p| !p.is_finite() || p < 0.0) {
            return Err(FilterError::InvalidModel(
                "transition probabilities must be finite and non-negative".into(),
            ));
        }
        for (j, column) in transition.columns().into_iter().enumerate() {
            let sum = column.sum();
            if (sum - 1.0).abs() > STOCHASTIC_TOLERANCE {
                return Err(FilterError::InvalidModel(format!(
                    "transition column {j} sums to {sum}, expected 1"
                )));
            }
        }

        if observations.is_empty() {
            return Err(FilterError::InvalidModel(
                "at least one observation vector is required".into(),
            ));
        }
        let mut stacked = Array2::zeros((observations.len(), rows));
        for (r, obs) in observations.iter().enumerate() {
            if obs.len() != rows {
                return Err(FilterError::InvalidModel(format!(
                    "observation {r} has {} entries, expected {rows}",
                    obs.len()
                )));
            }
            if obs.iter().any(|&p| !(0.0..=1.0).contains(&p)) {
                return Err(FilterError::InvalidModel(format!(
                    "observation {r} has a probability outside [0, 1]"
                )));
            }
            stacked.row_mut(r).assign(obs);
        }

        let transposed = transition.t().to_owned();
        Ok(MatrixModel {
            transition,
            transposed,
            observations: stacked,
        })
    }

    /// Observation probabilities, one row per reading.
    pub fn observations(&self) -> &Array2<f64> {
        &self.observations
    }
}

impl HiddenMarkovModel for MatrixModel {
    fn state_count(&self) -> usize {
        self.transition.nrows()
    }

    fn reading_count(&self) -> usize {
        self.observations.nrows()
    }

    fn transition_matrix(&self) -> &Array2<f64> {
        &self.transition
    }

    fn transposed_transition_matrix(&self) -> &Array2<f64> {
        &self.transposed
    }

    fn observation_vector(&self, reading: Reading) -> Result<ArrayView1<'_, f64>, FilterError> {
        if reading.0 >= self.reading_count() {
            return Err(FilterError::UnknownReading {
                reading: reading.0,
                count: self.reading_count(),
            });
        }
        Ok(self.observations.row(reading.0))
    }
}

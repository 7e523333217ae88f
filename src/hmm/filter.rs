use std::collections::VecDeque;

use ndarray::Array1;
use tracing::trace;

use super::model::{HiddenMarkovModel, Reading};
use crate::error::FilterError;

/// Floor applied to every entry during smoothing before renormalizing.
pub const SMOOTHING_FLOOR: f64 = 1e-10;

/// Below this total mass a belief cannot be renormalized.
pub const DEGENERATE_MASS: f64 = 1e-300;

/// Default fixed-lag window length.
pub const DEFAULT_LAG: usize = 5;

/// One forward step: `O_reading · T · belief`, renormalized.
pub fn filter<M: HiddenMarkovModel + ?Sized>(
    model: &M,
    belief: &Array1<f64>,
    reading: Reading,
) -> Result<Array1<f64>, FilterError> {
    check_dimension(model, belief)?;
    let predicted = model.transition_matrix().dot(belief);
    let observation = model.observation_vector(reading)?;
    normalize(&observation * &predicted)
}

/// Smoothed belief for the oldest step of a fixed-lag window.
///
/// Histories are ordered oldest first. The backward message starts as all
/// ones and absorbs readings from the most recent down to the one right
/// after the oldest step; the oldest reading is already part of
/// `beliefs[0]`.
pub fn smooth_lag<M: HiddenMarkovModel + ?Sized>(
    model: &M,
    readings: &[Reading],
    beliefs: &[Array1<f64>],
) -> Result<Array1<f64>, FilterError> {
    if readings.is_empty() || readings.len() != beliefs.len() {
        return Err(FilterError::InvalidHistory {
            readings: readings.len(),
            beliefs: beliefs.len(),
        });
    }
    for belief in beliefs {
        check_dimension(model, belief)?;
    }

    let mut backward = Array1::ones(model.state_count());
    for &reading in readings[1..].iter().rev() {
        let observation = model.observation_vector(reading)?;
        backward = floor_normalize(
            model
                .transposed_transition_matrix()
                .dot(&(&observation * &backward)),
        );
    }

    Ok(floor_normalize(&beliefs[0] * &backward))
}

fn check_dimension<M: HiddenMarkovModel + ?Sized>(
    model: &M,
    vector: &Array1<f64>,
) -> Result<(), FilterError> {
    if vector.len() != model.state_count() {
        return Err(FilterError::DimensionMismatch {
            expected: model.state_count(),
            got: vector.len(),
        });
    }
    Ok(())
}

fn normalize(vector: Array1<f64>) -> Result<Array1<f64>, FilterError> {
    let sum = vector.sum();
    if !sum.is_finite() || sum <= DEGENERATE_MASS {
        return Err(FilterError::DegenerateBelief { sum });
    }
    Ok(vector / sum)
}

fn floor_normalize(mut vector: Array1<f64>) -> Array1<f64> {
    vector.mapv_inplace(|p| p.max(SMOOTHING_FLOOR));
    let sum = vector.sum();
    vector / sum
}

/// Bounded history of `(reading, belief)` pairs, most recent last.
#[derive(Debug, Clone)]
pub struct LagWindow {
    entries: VecDeque<(Reading, Array1<f64>)>,
    capacity: usize,
}

impl LagWindow {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        LagWindow {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, reading: Reading, belief: Array1<f64>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((reading, belief));
    }

    pub fn readings(&self) -> Vec<Reading> {
        self.entries.iter().map(|(reading, _)| *reading).collect()
    }

    pub fn beliefs(&self) -> Vec<Array1<f64>> {
        self.entries.iter().map(|(_, belief)| belief.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Running forward filter that owns its belief and lag window.
pub struct HmmFilter<M> {
    model: M,
    belief: Array1<f64>,
    window: LagWindow,
}

impl<M: HiddenMarkovModel> HmmFilter<M> {
    /// Start from the uniform belief.
    pub fn new(model: M, lag: usize) -> Self {
        let belief = uniform(model.state_count());
        HmmFilter {
            model,
            belief,
            window: LagWindow::new(lag),
        }
    }

    /// Start from `belief`, which is renormalized.
    pub fn with_belief(model: M, belief: Array1<f64>, lag: usize) -> Result<Self, FilterError> {
        check_dimension(&model, &belief)?;
        if belief.iter().any(|&p| p < 0.0) {
            return Err(FilterError::InvalidBelief(
                "initial belief has negative entries".into(),
            ));
        }
        let belief = normalize(belief)?;
        Ok(HmmFilter {
            model,
            belief,
            window: LagWindow::new(lag),
        })
    }

    /// Fold one reading into the belief and remember it for smoothing.
    pub fn update(&mut self, reading: Reading) -> Result<&Array1<f64>, FilterError> {
        let next = filter(&self.model, &self.belief, reading)?;
        self.window.push(reading, next.clone());
        self.belief = next;
        trace!(reading = reading.0, window = self.window.len(), "belief updated");
        Ok(&self.belief)
    }

    /// Smoothed belief for the oldest step still in the window.
    pub fn smoothed(&self) -> Result<Array1<f64>, FilterError> {
        smooth_lag(&self.model, &self.window.readings(), &self.window.beliefs())
    }

    pub fn belief(&self) -> &Array1<f64> {
        &self.belief
    }

    pub fn window(&self) -> &LagWindow {
        &self.window
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Back to the uniform belief with an empty window.
    pub fn reset(&mut self) {
        self.belief = uniform(self.model.state_count());
        self.window.clear();
    }
}

fn uniform(n: usize) -> Array1<f64> {
    Array1::from_elem(n, 1.0 / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::grid::GridModel;
    use crate::hmm::model::MatrixModel;
    use ndarray::{array, Array2};

    const TOL: f64 = 1e-9;

    fn assert_close(actual: &Array1<f64>, expected: &Array1<f64>) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() < TOL, "{actual} != {expected}");
        }
    }

    fn identity_model() -> MatrixModel {
        MatrixModel::new(Array2::eye(2), &[array![1.0, 1.0], array![1.0, 1.0]]).unwrap()
    }

    fn umbrella() -> MatrixModel {
        // Reading 0 = umbrella, 1 = no umbrella.
        MatrixModel::new(
            array![[0.7, 0.3], [0.3, 0.7]],
            &[array![0.9, 0.2], array![0.1, 0.8]],
        )
        .unwrap()
    }

    #[test]
    fn identity_model_leaves_belief_unchanged() {
        let belief = array![0.5, 0.5];
        for reading in [Reading(0), Reading(1)] {
            let next = filter(&identity_model(), &belief, reading).unwrap();
            assert_close(&next, &array![0.5, 0.5]);
        }
    }

    #[test]
    fn umbrella_forward_step() {
        // Day 1 with an umbrella: <0.818, 0.182>.
        let next = filter(&umbrella(), &array![0.5, 0.5], Reading(0)).unwrap();
        assert!((next[0] - 0.45 / 0.55).abs() < TOL);
        assert!((next[1] - 0.10 / 0.55).abs() < TOL);
    }

    #[test]
    fn filtered_belief_is_a_distribution() {
        let model = GridModel::new(4, 4).unwrap();
        let mut belief = uniform(model.state_count());
        for r in 0..model.reading_count() {
            belief = filter(&model, &belief, Reading(r)).unwrap();
            assert!((belief.sum() - 1.0).abs() < TOL);
            assert!(belief.iter().all(|&p| p >= 0.0));
        }
    }

    #[test]
    fn impossible_reading_is_degenerate() {
        let model = MatrixModel::new(Array2::eye(2), &[array![0.0, 1.0]]).unwrap();
        let result = filter(&model, &array![1.0, 0.0], Reading(0));
        assert!(matches!(result, Err(FilterError::DegenerateBelief { .. })));
    }

    #[test]
    fn wrong_dimension_is_rejected() {
        let result = filter(&umbrella(), &array![1.0, 0.0, 0.0], Reading(0));
        assert_eq!(
            result,
            Err(FilterError::DimensionMismatch {
                expected: 2,
                got: 3
            })
        );
    }

    #[test]
    fn smoothing_single_step_returns_stored_belief() {
        let belief = array![0.2, 0.8];
        let smoothed = smooth_lag(&umbrella(), &[Reading(0)], &[belief.clone()]).unwrap();
        assert_close(&smoothed, &belief);
    }

    #[test]
    fn umbrella_smoothing_two_steps() {
        // Two umbrella days: smoothed day 1 is <0.883, 0.117>.
        let model = umbrella();
        let f1 = filter(&model, &array![0.5, 0.5], Reading(0)).unwrap();
        let f2 = filter(&model, &f1, Reading(0)).unwrap();
        let smoothed = smooth_lag(&model, &[Reading(0), Reading(0)], &[f1, f2]).unwrap();
        // b = Tᵗ · O · 1 = <0.69, 0.41>; s ∝ <0.818 * 0.69, 0.182 * 0.41>.
        let s0 = (0.45 / 0.55) * 0.69;
        let s1 = (0.10 / 0.55) * 0.41;
        assert!((smoothed[0] - s0 / (s0 + s1)).abs() < TOL);
        assert!((smoothed.sum() - 1.0).abs() < TOL);
    }

    #[test]
    fn smoothing_rejects_bad_history() {
        let model = umbrella();
        assert_eq!(
            smooth_lag(&model, &[], &[]),
            Err(FilterError::InvalidHistory {
                readings: 0,
                beliefs: 0
            })
        );
        assert_eq!(
            smooth_lag(&model, &[Reading(0), Reading(1)], &[array![0.5, 0.5]]),
            Err(FilterError::InvalidHistory {
                readings: 2,
                beliefs: 1
            })
        );
    }

    #[test]
    fn smoothing_floors_zero_entries() {
        // State 1 is impossible in the stored belief; the floor keeps it
        // positive but tiny.
        let model = umbrella();
        let smoothed = smooth_lag(
            &model,
            &[Reading(0), Reading(1)],
            &[array![1.0, 0.0], array![0.5, 0.5]],
        )
        .unwrap();
        assert!(smoothed[1] > 0.0 && smoothed[1] < 1e-9);
        assert!((smoothed.sum() - 1.0).abs() < TOL);
    }

    #[test]
    fn window_is_bounded() {
        let mut hmm = HmmFilter::new(umbrella(), 3);
        for i in 0..10 {
            hmm.update(Reading(i % 2)).unwrap();
            assert!(hmm.window().len() <= 3);
        }
        assert!(hmm.window().is_full());
        assert_eq!(hmm.window().readings(), vec![Reading(1), Reading(0), Reading(1)]);
    }

    #[test]
    fn filter_update_tracks_latest_belief() {
        let mut hmm = HmmFilter::new(umbrella(), DEFAULT_LAG);
        let expected = filter(&umbrella(), &array![0.5, 0.5], Reading(0)).unwrap();
        let belief = hmm.update(Reading(0)).unwrap().clone();
        assert_close(&belief, &expected);
        assert_close(&hmm.smoothed().unwrap(), &expected);

        hmm.reset();
        assert!(hmm.window().is_empty());
        assert_close(hmm.belief(), &array![0.5, 0.5]);
        assert!(hmm.smoothed().is_err());
    }

    #[test]
    fn with_belief_normalizes() {
        let hmm = HmmFilter::with_belief(umbrella(), array![2.0, 6.0], 2).unwrap();
        assert_close(hmm.belief(), &array![0.25, 0.75]);
        assert!(HmmFilter::with_belief(umbrella(), array![0.0, 0.0], 2).is_err());
        assert!(HmmFilter::with_belief(umbrella(), array![1.0], 2).is_err());
    }

    #[test]
    fn negative_initial_belief_is_a_belief_error() {
        let Err(err) = HmmFilter::with_belief(umbrella(), array![1.5, -0.5], 2) else {
            panic!("negative belief accepted");
        };
        assert!(matches!(err, FilterError::InvalidBelief(_)), "got {err:?}");
    }
}

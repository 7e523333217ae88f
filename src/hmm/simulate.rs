use std::collections::VecDeque;

use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::filter::HmmFilter;
use super::grid::GridModel;
use super::model::{HiddenMarkovModel, Reading};
use crate::error::FilterError;

/// Samples a true robot trajectory and its sensor readings from a grid model.
pub struct RobotSimulator<'a> {
    model: &'a GridModel,
    rng: StdRng,
    state: usize,
}

impl<'a> RobotSimulator<'a> {
    /// Start in a uniformly random state.
    pub fn new(model: &'a GridModel, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let state = rng.random_range(0..model.state_count());
        RobotSimulator { model, rng, state }
    }

    pub fn state(&self) -> usize {
        self.state
    }

    /// Move the robot one step and sample what the sensor reports.
    pub fn step(&mut self) -> (usize, Reading) {
        let transition = self.model.transition_matrix();
        self.state = sample(transition.column(self.state), &mut self.rng);
        let reading = sample(self.model.observations().column(self.state), &mut self.rng);
        (self.state, Reading(reading))
    }
}

/// Draw an index with probability proportional to `weights`.
fn sample(weights: ArrayView1<'_, f64>, rng: &mut StdRng) -> usize {
    let u: f64 = rng.random::<f64>() * weights.sum();
    let mut acc = 0.0;
    let mut last_positive = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        acc += w;
        last_positive = i;
        if u < acc {
            return i;
        }
    }
    last_positive
}

/// Summary of a tracking run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingReport {
    pub steps: usize,
    /// Mean Manhattan distance between the filtered estimate and the truth.
    pub filtered_error: f64,
    /// Mean Manhattan distance of the smoothed estimate, lagged by the window.
    pub smoothed_error: f64,
    pub smoothed_steps: usize,
    pub nothing_readings: usize,
    /// Expected error of guessing a cell uniformly at random.
    pub uniform_guess_error: f64,
}

/// Simulate `steps` moves on `model` and track the robot with a forward
/// filter plus fixed-lag smoothing.
pub fn run_tracking(
    model: &GridModel,
    steps: usize,
    lag: usize,
    seed: u64,
) -> Result<TrackingReport, FilterError> {
    let mut simulator = RobotSimulator::new(model, seed);
    let mut hmm = HmmFilter::new(model, lag);
    let mut recent_truth: VecDeque<(usize, usize)> = VecDeque::with_capacity(lag.max(1));

    let mut filtered_total = 0usize;
    let mut smoothed_total = 0usize;
    let mut smoothed_steps = 0usize;
    let mut nothing_readings = 0usize;

    for _ in 0..steps {
        let (state, reading) = simulator.step();
        let truth = model.state_cell(state);
        if reading == model.nothing_reading() {
            nothing_readings += 1;
        }

        hmm.update(reading)?;
        filtered_total += manhattan(truth, model.most_likely_cell(hmm.belief()));

        if recent_truth.len() == hmm.window().capacity() {
            recent_truth.pop_front();
        }
        recent_truth.push_back(truth);

        if hmm.window().is_full() {
            let smoothed = hmm.smoothed()?;
            if let Some(&oldest) = recent_truth.front() {
                smoothed_total += manhattan(oldest, model.most_likely_cell(&smoothed));
                smoothed_steps += 1;
            }
        }
    }

    let mean = |total: usize, n: usize| if n == 0 { 0.0 } else { total as f64 / n as f64 };
    let report = TrackingReport {
        steps,
        filtered_error: mean(filtered_total, steps),
        smoothed_error: mean(smoothed_total, smoothed_steps),
        smoothed_steps,
        nothing_readings,
        uniform_guess_error: model.uniform_guess_error(),
    };

    info!(
        rows = model.rows(),
        cols = model.cols(),
        steps,
        lag,
        filtered_error = report.filtered_error,
        smoothed_error = report.smoothed_error,
        nothing_readings,
        "tracking finished"
    );
    Ok(report)
}

fn manhattan(a: (usize, usize), b: (usize, usize)) -> usize {
    a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
}

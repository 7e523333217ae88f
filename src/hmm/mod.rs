//! Probabilistic state tracking: HMM forward filtering with fixed-lag
//! smoothing, a grid localization model, and a simulator to exercise them.

pub mod filter;
pub mod grid;
pub mod model;
pub mod simulate;

pub use filter::{filter, smooth_lag, HmmFilter, LagWindow, DEFAULT_LAG};
pub use grid::{GridModel, Heading};
pub use model::{HiddenMarkovModel, MatrixModel, Reading};
pub use simulate::{run_tracking, RobotSimulator, TrackingReport};

//! # Connect Four HMM
//!
//! A Connect Four search engine and an HMM state tracker.
//!
//! ## Modules
//!
//! - [`game`] — Board, player and game state with legal-move handling
//! - [`ai`] — Static evaluation, minimax with alpha-beta pruning, agents
//! - [`hmm`] — Forward filtering, fixed-lag smoothing, grid localization
//! - [`play`] — Matches between agents and the match-server contract
//! - [`config`] — TOML configuration loading and validation
//! - [`logging`] — `tracing` subscriber setup
//! - [`error`] — Structured error types

pub mod ai;
pub mod config;
pub mod error;
pub mod game;
pub mod hmm;
pub mod logging;
pub mod play;

//! Running games between agents, locally or through a match server.

pub mod server;
mod session;

pub use server::{
    play_against_server, LocalMatchServer, MatchServer, MoveResponse, ServerGameReport,
};
pub use session::{play_match, play_series, MatchReport, MatchResult, SeriesSummary};

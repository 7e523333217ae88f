use std::path::PathBuf;

/// Errors from placing a disc on the board or advancing a game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("column {0} is full")]
    ColumnFull(usize),

    #[error("column {0} is out of range")]
    InvalidColumn(usize),

    #[error("game is already over")]
    GameOver,

    #[error("invalid cell value {value} at row {row}, column {col}")]
    InvalidCell { row: usize, col: usize, value: i8 },

    #[error("disc at row {row}, column {col} has an empty cell below it")]
    FloatingDisc { row: usize, col: usize },
}

/// Errors from the game search engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("no legal move: every column is full or the game is over")]
    NoLegalMove,
}

/// Errors from the HMM state tracker.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("belief has no probability mass left to normalize (sum = {sum:e})")]
    DegenerateBelief { sum: f64 },

    #[error("invalid history: {readings} readings vs {beliefs} beliefs")]
    InvalidHistory { readings: usize, beliefs: usize },

    #[error("unknown reading {reading} (model has {count} readings)")]
    UnknownReading { reading: usize, count: usize },

    #[error("vector has {got} entries, model has {expected} states")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("invalid belief: {0}")]
    InvalidBelief(String),
}

/// Errors from playing a match between agents or against a match server.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("search failed: {0}")]
    Search(#[from] SearchError),

    #[error("move rejected: {0}")]
    Move(#[from] MoveError),

    #[error("match server error: {0}")]
    Server(String),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_error_display() {
        assert_eq!(MoveError::ColumnFull(4).to_string(), "column 4 is full");
        let err = MoveError::FloatingDisc { row: 2, col: 6 };
        assert_eq!(
            err.to_string(),
            "disc at row 2, column 6 has an empty cell below it"
        );
    }

    #[test]
    fn test_filter_error_display() {
        let err = FilterError::InvalidHistory {
            readings: 3,
            beliefs: 2,
        };
        assert_eq!(err.to_string(), "invalid history: 3 readings vs 2 beliefs");
    }

    #[test]
    fn test_match_error_from_search_error() {
        let err: MatchError = SearchError::NoLegalMove.into();
        assert!(matches!(err, MatchError::Search(SearchError::NoLegalMove)));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("search.max_depth must be <= 42".to_string());
        assert_eq!(
            err.to_string(),
            "config validation error: search.max_depth must be <= 42"
        );
    }
}

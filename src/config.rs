use std::path::Path;
use std::str::FromStr;

use tracing::Level;

use crate::ai::{Agent, MinimaxAgent, RandomAgent, SearchConfig};
use crate::error::ConfigError;
use crate::game::{COLS, ROWS};
use crate::hmm::DEFAULT_LAG;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub tracker: TrackerConfig,
    pub play: PlayConfig,
    pub logging: LoggingConfig,
}

/// Settings for the grid localization simulation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub rows: usize,
    pub cols: usize,
    pub lag: usize,
    pub steps: usize,
    pub seed: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            rows: 8,
            cols: 8,
            lag: DEFAULT_LAG,
            steps: 500,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpponentKind {
    #[default]
    Random,
    Minimax,
}

/// Settings for local matches and the match server.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlayConfig {
    pub games: usize,
    pub seed: u64,
    pub opponent: OpponentKind,
    /// Search depth when the opponent is `minimax`.
    pub opponent_depth: usize,
}

impl Default for PlayConfig {
    fn default() -> Self {
        PlayConfig {
            games: 10,
            seed: 7,
            opponent: OpponentKind::Random,
            opponent_depth: 2,
        }
    }
}

impl PlayConfig {
    /// Build the configured opponent. `index` varies the random seed between games.
    pub fn opponent(&self, index: u64) -> Box<dyn Agent> {
        match self.opponent {
            OpponentKind::Random => Box::new(RandomAgent::seeded(self.seed.wrapping_add(index))),
            OpponentKind::Minimax => Box::new(MinimaxAgent::new(self.opponent_depth)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn level(&self) -> Option<Level> {
        Level::from_str(&self.level).ok()
    }
}

/// Where a loaded [`AppConfig`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    /// The file was missing and built-in defaults were used.
    Defaults,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist. The returned [`ConfigSource`] says which happened, so the
    /// caller can report the fallback once logging is up.
    pub fn load_or_default(path: &Path) -> Result<(Self, ConfigSource), ConfigError> {
        if path.exists() {
            Ok((Self::load(path)?, ConfigSource::File))
        } else {
            Ok((Self::default(), ConfigSource::Defaults))
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.max_depth > ROWS * COLS {
            return Err(ConfigError::Validation(format!(
                "search.max_depth must be <= {}",
                ROWS * COLS
            )));
        }
        if self.search.max_nodes == Some(0) {
            return Err(ConfigError::Validation(
                "search.max_nodes must be > 0 when set".into(),
            ));
        }

        if self.tracker.rows < 2 || self.tracker.cols < 2 {
            return Err(ConfigError::Validation(
                "tracker.rows and tracker.cols must be >= 2".into(),
            ));
        }
        if self.tracker.lag == 0 {
            return Err(ConfigError::Validation("tracker.lag must be >= 1".into()));
        }
        if self.tracker.steps == 0 {
            return Err(ConfigError::Validation("tracker.steps must be >= 1".into()));
        }

        if self.play.games == 0 {
            return Err(ConfigError::Validation("play.games must be >= 1".into()));
        }
        if self.play.opponent_depth > ROWS * COLS {
            return Err(ConfigError::Validation(format!(
                "play.opponent_depth must be <= {}",
                ROWS * COLS
            )));
        }

        if self.logging.level().is_none() {
            return Err(ConfigError::Validation(format!(
                "logging.level '{}' is not a valid level",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(&AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MoveOrder;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().expect("default config should be valid");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[search]
max_depth = 3
move_order = "left_to_right"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.search.max_depth, 3);
        assert_eq!(config.search.move_order, MoveOrder::LeftToRight);
        // Other fields should be defaults
        assert!(!config.search.parallel);
        assert_eq!(config.tracker, TrackerConfig::default());
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_validation_rejects_deep_search() {
        let mut config = AppConfig::default();
        config.search.max_depth = 43;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_node_budget() {
        let mut config = AppConfig::default();
        config.search.max_nodes = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_small_grid() {
        let mut config = AppConfig::default();
        config.tracker.cols = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_lag() {
        let mut config = AppConfig::default();
        config.tracker.lag = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_games() {
        let mut config = AppConfig::default();
        config.play.games = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_level() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn test_unknown_opponent_fails_to_parse() {
        let toml_str = r#"
[play]
opponent = "oracle"
"#;
        assert!(toml::from_str::<AppConfig>(toml_str).is_err());
    }

    #[test]
    fn test_opponent_names() {
        let mut play = PlayConfig::default();
        assert_eq!(play.opponent(0).name(), RandomAgent::seeded(0).name());
        play.opponent = OpponentKind::Minimax;
        assert_eq!(play.opponent(0).name(), "Minimax");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let (config, source) =
            AppConfig::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(source, ConfigSource::Defaults);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_load_or_default_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("present.toml");
        std::fs::write(&path, "[play]\ngames = 3\n").unwrap();
        let (config, source) = AppConfig::load_or_default(&path).unwrap();
        assert_eq!(source, ConfigSource::File);
        assert_eq!(config.play.games, 3);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
[tracker]
rows = 5
steps = 120

[play]
opponent = "minimax"
"#
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.tracker.rows, 5);
        assert_eq!(config.tracker.steps, 120);
        assert_eq!(config.play.opponent, OpponentKind::Minimax);
        // Others are defaults
        assert_eq!(config.tracker.cols, 8);
        assert_eq!(config.search.max_depth, 5);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[tracker]\nlag = 0\n").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_default_toml_roundtrips() {
        let toml_str = AppConfig::default_toml().unwrap();
        let config: AppConfig = toml::from_str(&toml_str).unwrap();
        config.validate().expect("roundtripped config should be valid");
        assert_eq!(config, AppConfig::default());
    }
}

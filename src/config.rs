use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{SessionError, SessionResult};
use crate::game::GameKind;
use crate::generator::{
    MAX_GRID_SIZE, MIN_GRID_SIZE, PLATE_COUNT, TARGET_MARGIN, TARGET_MAX_SIZE,
};

pub const MAX_NBACK_LEVEL: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
        }
    }
}

/// Parameters of one session; frozen once the session starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Starting level, or `n` for N-back
    pub level: u32,
    /// Number of counted trials before the summary
    pub length: Option<usize>,
    pub time_limit_secs: Option<u32>,
    pub lives: Option<u32>,
    /// Passing this level ends the session
    pub max_level: Option<u32>,
    pub arena: Arena,
    /// Starting side of the visual memory grid
    pub grid_size: usize,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            level: 1,
            length: None,
            time_limit_secs: None,
            lives: None,
            max_level: None,
            arena: Arena::default(),
            grid_size: MIN_GRID_SIZE + 1,
            seed: None,
        }
    }
}

fn invalid(msg: impl Into<String>) -> SessionError {
    SessionError::InvalidConfig(msg.into())
}

impl GameConfig {
    pub fn validate(&self, kind: GameKind) -> SessionResult<()> {
        if self.level == 0 {
            return Err(invalid("level must be at least 1"));
        }
        if self.length == Some(0) {
            return Err(invalid("length must be at least 1"));
        }
        if self.time_limit_secs == Some(0) {
            return Err(invalid("time limit must be at least 1 second"));
        }
        if self.lives == Some(0) {
            return Err(invalid("lives must be at least 1"));
        }
        if let Some(max) = self.max_level {
            if max < self.level {
                return Err(invalid(format!(
                    "max level {} is below starting level {}",
                    max, self.level
                )));
            }
        }

        match kind {
            GameKind::NBack => {
                if self.level > MAX_NBACK_LEVEL {
                    return Err(invalid(format!(
                        "n-back level must be between 1 and {}",
                        MAX_NBACK_LEVEL
                    )));
                }
                if self.length.is_none() {
                    return Err(invalid("n-back needs a sequence length"));
                }
            }
            GameKind::ColorBlind => {
                if self.length.unwrap_or(PLATE_COUNT) > PLATE_COUNT {
                    return Err(invalid(format!("only {} plates exist", PLATE_COUNT)));
                }
            }
            GameKind::VisualMemory => {
                if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&self.grid_size) {
                    return Err(invalid(format!(
                        "grid size must be between {} and {}",
                        MIN_GRID_SIZE, MAX_GRID_SIZE
                    )));
                }
            }
            GameKind::AimTrainer => {
                let min_side = TARGET_MAX_SIZE + 2.0 * TARGET_MARGIN;
                let Arena { width, height } = self.arena;
                if !(width.is_finite() && height.is_finite())
                    || width < min_side
                    || height < min_side
                {
                    return Err(invalid(format!(
                        "arena must be at least {min_side}x{min_side}"
                    )));
                }
            }
            _ => {}
        }

        Ok(())
    }
}

/// User preferences persisted between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub nback_level: u32,
    pub aim_secs: u32,
    pub typing_secs: u32,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nback_level: 1,
            aim_secs: 30,
            typing_secs: 60,
            seed: None,
        }
    }
}

impl Config {
    /// Session parameters for `kind` with these preferences applied
    pub fn game_config(&self, kind: GameKind) -> GameConfig {
        let mut cfg = kind.default_config();
        match kind {
            GameKind::NBack => {
                cfg.level = self.nback_level;
                cfg.length = Some(crate::game::nback_sequence_length(self.nback_level));
            }
            GameKind::AimTrainer => cfg.time_limit_secs = Some(self.aim_secs),
            GameKind::Typing => cfg.time_limit_secs = Some(self.typing_secs),
            _ => {}
        }
        cfg.seed = self.seed;
        cfg
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "mindgames") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("mindgames_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => tracing::warn!(path = ?self.path, "ignoring unreadable config: {e}"),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = ?self.path, "cannot read config: {e}"),
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

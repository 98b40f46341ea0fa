use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::path::{PathDefinition, PathParseError, DEFAULT_TRACK};
use crate::sampler::{Curve, CurveError};
use crate::session::{
    GameSession, SessionConfig, DEFAULT_COMPLETION_THRESHOLD, DEFAULT_COUNTDOWN_TICKS,
    DEFAULT_PICKUP_DISTANCE, DEFAULT_TIME_LIMIT_SECS,
};
use crate::tracker::{
    SearchWindow, Tracker, DEFAULT_BACKTRACK, DEFAULT_LOOKAHEAD, DEFAULT_SAFE_RADIUS,
};

pub const DEFAULT_RESOLUTION: usize = 1000;
/// Far beyond anything a terminal canvas can show.
pub const MAX_RESOLUTION: usize = 100_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("time limit must be at least one second")]
    ZeroTimeLimit,
    #[error("resolution must be at least 1")]
    ZeroResolution,
    #[error("resolution must be at most 100000, got {0}")]
    ResolutionTooHigh(usize),
    #[error("track samples are {step:.1} units apart; raise the resolution so they sit closer than the safe radius {safe_radius}")]
    TooCoarse { step: f64, safe_radius: f64 },
    #[error("{0} must be a positive finite number")]
    NonPositive(&'static str),
    #[error("completion threshold must be in (0, 100], got {0}")]
    Threshold(f64),
    #[error("invalid track: {0}")]
    Track(#[from] PathParseError),
    #[error("invalid curve: {0}")]
    Curve(#[from] CurveError),
}

/// Size of the curve coordinate space, matching the track's authoring canvas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ViewBox {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewBox {
    fn default() -> Self {
        Self {
            width: 350.0,
            height: 500.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub time_limit_secs: u32,
    pub countdown_ticks: u32,
    pub resolution: usize,
    pub safe_radius: f64,
    pub pickup_distance: f64,
    pub backtrack: usize,
    pub lookahead: usize,
    pub completion_threshold: f64,
    pub track: String,
    pub view_box: ViewBox,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            countdown_ticks: DEFAULT_COUNTDOWN_TICKS,
            resolution: DEFAULT_RESOLUTION,
            safe_radius: DEFAULT_SAFE_RADIUS,
            pickup_distance: DEFAULT_PICKUP_DISTANCE,
            backtrack: DEFAULT_BACKTRACK,
            lookahead: DEFAULT_LOOKAHEAD,
            completion_threshold: DEFAULT_COMPLETION_THRESHOLD,
            track: DEFAULT_TRACK.to_string(),
            view_box: ViewBox::default(),
        }
    }
}

fn positive(value: f64, name: &'static str) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive(name))
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_limit_secs == 0 {
            return Err(ConfigError::ZeroTimeLimit);
        }
        if self.resolution == 0 {
            return Err(ConfigError::ZeroResolution);
        }
        if self.resolution > MAX_RESOLUTION {
            return Err(ConfigError::ResolutionTooHigh(self.resolution));
        }
        positive(self.safe_radius, "safe radius")?;
        positive(self.pickup_distance, "pickup distance")?;
        positive(self.view_box.width, "view box width")?;
        positive(self.view_box.height, "view box height")?;
        if !(self.completion_threshold > 0.0 && self.completion_threshold <= 100.0) {
            return Err(ConfigError::Threshold(self.completion_threshold));
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            time_limit_secs: self.time_limit_secs,
            countdown_ticks: self.countdown_ticks,
            pickup_distance: self.pickup_distance,
            completion_threshold: self.completion_threshold,
            tracker: Tracker::new(
                SearchWindow {
                    backtrack: self.backtrack,
                    lookahead: self.lookahead,
                },
                self.safe_radius,
            ),
        }
    }

    /// Parse and sample the configured track. Samples must sit closer
    /// together than the safe radius or a cursor on the centreline between
    /// two of them would count as off the track.
    pub fn build_curve(&self) -> Result<Curve, ConfigError> {
        let definition = PathDefinition::parse(&self.track)?;
        let curve = Curve::sample(&definition, self.resolution)?;
        let step = curve.step_length();
        if step >= self.safe_radius {
            return Err(ConfigError::TooCoarse {
                step,
                safe_radius: self.safe_radius,
            });
        }
        Ok(curve)
    }

    /// Validate, sample the track and hand back an idle session.
    pub fn build_session(&self) -> Result<GameSession, ConfigError> {
        self.validate()?;
        let curve = Arc::new(self.build_curve()?);
        Ok(GameSession::new(curve, self.session_config()))
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
        let path = if let Some(pd) = ProjectDirs::from("", "", "steadypath") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("steadypath_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!("ignoring unreadable config {}: {e}", self.path.display()),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}

//! Runtime settings for the steering pipeline and the serial transmitter
//!
//! Every section has a `Default` matching the values the device was tuned with.
//! An optional TOML file can override any subset of fields:
//!
//! ```toml
//! [filter]
//! range = 200
//!
//! [transmitter]
//! device_path = "/dev/ttyUSB0"
//! ```

use crate::report::DEFAULT_SIGNATURE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable pointing at an explicit settings file
pub const CONFIG_ENV: &str = "HEADSTEER_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub camera: CameraSettings,
    pub filter: FilterSettings,
    pub estimator: EstimatorSettings,
    pub pipeline: PipelineSettings,
    pub transmitter: TransmitterSettings,
}

/// Depth stream parameters
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CameraSettings {
    /// Recorded z16 stream to replay; without one no device is available
    pub replay_path: Option<PathBuf>,
    pub width: usize,
    pub height: usize,
    pub fps: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            replay_path: None,
            width: 640,
            height: 480,
            fps: 60,
        }
    }
}

/// Depth binarization parameters
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FilterSettings {
    /// Width of the acceptance window above each region's nearest sample
    pub range: u16,

    /// Depth band width used by the region-assignment rule
    pub region_split: u16,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            range: 150,
            region_split: 314,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EstimatorSettings {
    /// Rows and columns excluded on every side of the mask
    pub border: usize,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self { border: 30 }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PipelineSettings {
    /// Steering loop period in milliseconds
    pub tick_ms: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self { tick_ms: 4 }
    }
}

/// Serial link parameters
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TransmitterSettings {
    pub device_path: String,
    pub baud_rate: u32,

    /// Gap written before every byte of a frame
    pub byte_delay_ms: u64,

    /// First payload byte of every report
    pub signature: u8,
}

impl Default for TransmitterSettings {
    fn default() -> Self {
        Self {
            device_path: "/dev/ttySAC0".to_string(),
            baud_rate: 9600,
            byte_delay_ms: 12,
            signature: DEFAULT_SIGNATURE,
        }
    }
}

impl Settings {
    /// Loads settings from `HEADSTEER_CONFIG` or the user config directory.
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load() -> Result<Self, ConfigError> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => dirs::config_dir().map(|dir| dir.join("headsteer").join("config.toml")),
        };

        match path {
            Some(path) if path.exists() => Self::from_file(&path),
            Some(path) => {
                debug!("No settings file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => {
                debug!("No config directory available, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading settings from {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

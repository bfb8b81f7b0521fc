//! Capture configuration

use crate::mask::{ColorRange, MaskStrategy};
use crate::pipeline::queue::DropPolicy;
use mooncap_core::control::{DEFAULT_TARGET_FRACTION, DEFAULT_ZOOM_RANGE};
use mooncap_core::instruction::DEFAULT_MISS_TOLERANCE;
use mooncap_core::{ControlError, ProportionalZoom, RandomRangeZoom, ZoomPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Invalid or unreadable configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("marker color range has inverted channel(s): {0:?}")]
    EmptyColorRange(Vec<&'static str>),

    #[error("frame queue depth must be at least 1")]
    ZeroQueueDepth,

    #[error(transparent)]
    Control(#[from] ControlError),
}

/// Main capture configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub detection: DetectionConfig,
    pub zoom: ZoomPolicyConfig,
    pub instruction: InstructionConfig,
    pub queue: QueueConfig,
}

/// Marker color isolation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub marker: ColorRange,
    pub strategy: MaskStrategy,
}

/// Zoom policy selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ZoomPolicyConfig {
    /// Uniform sample from `[min, max]` regardless of the region
    RandomRange { min: f64, max: f64 },
    /// Steer the moon toward `target_fraction` of the viewport
    Proportional { target_fraction: f64 },
}

/// Instruction state machine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstructionConfig {
    /// Consecutive misses before reverting to "searching"
    pub miss_tolerance: u32,
}

/// Frame buffering between camera source and pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub depth: usize,
    pub drop_policy: DropPolicy,
}

impl Default for ZoomPolicyConfig {
    fn default() -> Self {
        ZoomPolicyConfig::Proportional {
            target_fraction: DEFAULT_TARGET_FRACTION,
        }
    }
}

impl ZoomPolicyConfig {
    pub fn reference() -> Self {
        ZoomPolicyConfig::RandomRange {
            min: DEFAULT_ZOOM_RANGE.0,
            max: DEFAULT_ZOOM_RANGE.1,
        }
    }

    /// Instantiate the configured policy
    pub fn build(&self) -> Result<Box<dyn ZoomPolicy>, ControlError> {
        let policy: Box<dyn ZoomPolicy> = match *self {
            ZoomPolicyConfig::RandomRange { min, max } => Box::new(RandomRangeZoom::new(min, max)?),
            ZoomPolicyConfig::Proportional { target_fraction } => {
                Box::new(ProportionalZoom::new(target_fraction)?)
            }
        };
        Ok(policy)
    }
}

impl Default for InstructionConfig {
    fn default() -> Self {
        Self {
            miss_tolerance: DEFAULT_MISS_TOLERANCE,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            depth: 1,
            drop_policy: DropPolicy::DropNewest,
        }
    }
}

impl CaptureConfig {
    /// Legacy capture behavior: random 8-10x zoom, instruction
    /// follows every frame, one frame in flight and newer frames dropped.
    pub fn reference() -> Self {
        Self {
            zoom: ZoomPolicyConfig::reference(),
            ..Default::default()
        }
    }

    /// Proportional zoom with debounced instructions
    pub fn smoothed() -> Self {
        Self {
            instruction: InstructionConfig { miss_tolerance: 3 },
            queue: QueueConfig {
                depth: 2,
                drop_policy: DropPolicy::DropOldest,
            },
            ..Default::default()
        }
    }

    /// Check every section; called by the loaders and by pipeline setup
    pub fn validate(&self) -> Result<(), ConfigError> {
        let empty = self.detection.marker.empty_channels();
        if !empty.is_empty() {
            return Err(ConfigError::EmptyColorRange(empty));
        }
        if self.queue.depth == 0 {
            return Err(ConfigError::ZeroQueueDepth);
        }
        self.zoom.build()?;
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: CaptureConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

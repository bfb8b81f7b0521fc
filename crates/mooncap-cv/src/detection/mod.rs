//! High-level detection module

pub mod config;
pub mod detector;

pub use config::{
    CaptureConfig, ConfigError, DetectionConfig, InstructionConfig, QueueConfig, ZoomPolicyConfig,
};
pub use detector::MoonDetector;

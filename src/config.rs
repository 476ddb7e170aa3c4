//! # Configuration Management
//!
//! This module handles loading and managing the link configuration from multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with APP_ prefix, `__` between nesting levels)
//! - Default values (built into the code)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Environment variables (APP_AUDIO__STREAM_CAPACITY, APP_PROTOCOL__STATUS_INTERVAL_MS, etc.)
//! 2. Configuration file (config.toml)
//! 3. Default values (defined in the Default impl)
//!
//! The defaults are the device's stock constants; no configuration file is
//! needed.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration that contains all settings.
///
/// ## Why separate config structs:
/// Breaking configuration into logical groups (protocol, audio, device)
/// mirrors the components that consume them: the line framer and scheduler,
/// the audio buffers, and the device defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub protocol: ProtocolConfig,
    pub audio: AudioConfig,
    pub device: DeviceConfig,
}

/// Line framing and loop timing.
///
/// ## Fields:
/// - `max_line_length`: bytes buffered before a runaway line is discarded
/// - `stale_line_timeout_ms`: a half-built line older than this is cleared
/// - `boot_announce_delay_ms`: when the second `boot_complete` goes out
/// - `status_interval_ms`: period of unsolicited status messages
/// - `host_timeout_ms`: liveness window for [`crate::endpoint::Endpoint::is_host_connected`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub max_line_length: usize,
    pub stale_line_timeout_ms: u64,
    pub boot_announce_delay_ms: u64,
    pub status_interval_ms: u64,
    pub host_timeout_ms: u64,
}

/// Audio buffer sizes and playback pacing.
///
/// ## Memory budget:
/// `stream_capacity` is allocated once at startup and never grows; the
/// injection buffer holds at most `injection_capacity` samples.
/// At 16 kHz mono, 1600 samples is 100 ms and 160 samples is 10 ms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Outbound staging buffer size in bytes
    pub stream_capacity: usize,
    /// Bytes handed to the playback sink per write
    pub sink_chunk_size: usize,
    /// Pause between stop and start when a sink write accepts nothing
    pub sink_retry_pause_ms: u64,
    /// Pause after a partial sink write
    pub sink_backpressure_pause_ms: u64,
    /// Pause between consecutive sink writes
    pub sink_chunk_pause_ms: u64,
    /// Consecutive zero-byte writes (after retry) before a flush is abandoned
    pub max_stalled_writes: u32,
    /// Largest `total_chunks` a chunked clip may declare
    pub max_total_chunks: usize,
    /// Injection ring capacity in samples
    pub injection_capacity: usize,
    /// Samples evicted per step when the injection ring overflows
    pub injection_eviction_block: usize,
    /// How long injected audio counts as "recent"
    pub injection_recency_ms: u64,
    pub sample_rate: u32,
    /// Raw PCM file used as the playback sink by the binary (no sink when unset)
    pub playback_file: Option<PathBuf>,
}

/// Initial device state reported to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub wake_word: String,
    pub sensitivity: String,
    pub wake_word_options: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            protocol: ProtocolConfig {
                max_line_length: 512,
                stale_line_timeout_ms: 5000,
                boot_announce_delay_ms: 3000,
                status_interval_ms: 10000,
                host_timeout_ms: 15000,
            },
            audio: AudioConfig {
                stream_capacity: 16 * 1024,
                sink_chunk_size: 512,
                sink_retry_pause_ms: 10,
                sink_backpressure_pause_ms: 5,
                sink_chunk_pause_ms: 1,
                max_stalled_writes: 8,
                // one sample per chunk still fits the stream buffer
                max_total_chunks: 16 * 1024 / 2,
                injection_capacity: 1600,
                injection_eviction_block: 160,
                injection_recency_ms: 100,
                sample_rate: 16000,
                playback_file: None,
            },
            device: DeviceConfig {
                wake_word: "Okay Nabu".to_string(),
                sensitivity: "Moderately sensitive".to_string(),
                wake_word_options: vec![
                    "Okay Nabu".to_string(),
                    "Hey Jarvis".to_string(),
                    "Hey Mycroft".to_string(),
                    "Stop".to_string(),
                ],
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Configuration Loading Process:
    /// 1. Start with built-in defaults
    /// 2. Override with values from config.toml (if it exists)
    /// 3. Override with environment variables prefixed with APP_
    ///
    /// ## Environment Variable Examples:
    /// - `APP_AUDIO__PLAYBACK_FILE=/tmp/out.pcm`: play audio into a raw PCM file
    /// - `APP_PROTOCOL__STATUS_INTERVAL_MS=2000`: more frequent status messages
    pub fn load() -> AppResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// ## What this checks:
    /// - Buffers and chunk sizes are non-zero (a zero-sized buffer would drop everything)
    /// - The eviction block fits inside the injection ring
    /// - The wake word option list is not empty
    pub fn validate(&self) -> AppResult<()> {
        if self.protocol.max_line_length == 0 {
            return Err(AppError::Validation("max_line_length must be greater than 0".to_string()));
        }

        if self.audio.stream_capacity == 0 {
            return Err(AppError::Validation("stream_capacity must be greater than 0".to_string()));
        }

        if self.audio.sink_chunk_size == 0 {
            return Err(AppError::Validation("sink_chunk_size must be greater than 0".to_string()));
        }

        if self.audio.max_total_chunks == 0 {
            return Err(AppError::Validation("max_total_chunks must be greater than 0".to_string()));
        }

        if self.audio.injection_capacity == 0 {
            return Err(AppError::Validation("injection_capacity must be greater than 0".to_string()));
        }

        if self.audio.injection_eviction_block == 0
            || self.audio.injection_eviction_block > self.audio.injection_capacity
        {
            return Err(AppError::Validation(format!(
                "injection_eviction_block must be between 1 and {}",
                self.audio.injection_capacity
            )));
        }

        if self.device.wake_word_options.is_empty() {
            return Err(AppError::Validation("wake_word_options must not be empty".to_string()));
        }

        Ok(())
    }

    /// Render the effective configuration as TOML for the startup log.
    pub fn dump_config(&self) -> String {
        match toml::to_string_pretty(self) {
            Ok(text) => text,
            Err(err) => format!("<unable to render configuration: {}>", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that the default configuration is valid and matches the stock constants.
    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.protocol.max_line_length, 512);
        assert_eq!(config.audio.stream_capacity, 16384);
        assert_eq!(config.audio.injection_capacity, 1600);
        assert_eq!(config.audio.max_total_chunks, 8192);
        assert_eq!(config.device.wake_word, "Okay Nabu");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.audio.stream_capacity = 0;
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));

        let mut config = AppConfig::default();
        config.audio.injection_eviction_block = 2000;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.audio.max_total_chunks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dump_config_is_toml() {
        let text = AppConfig::default().dump_config();
        assert!(text.contains("[protocol]"));
        assert!(text.contains("stream_capacity = 16384"));
    }
}

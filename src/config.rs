// SPDX-License-Identifier: MPL-2.0
//! Engine configuration: render target size, loop pacing, and the read
//! retry policy, with optional persistence to a `player.toml` file.
//!
//! All values have defaults, so `PlayerConfig::default()` is a fully usable
//! configuration. Loading tolerates missing fields.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "player.toml";
const APP_NAME: &str = "PrismPlayer";

/// Default output frame width handed to the renderer sink.
pub const DEFAULT_RENDER_WIDTH: u32 = 800;
/// Default output frame height handed to the renderer sink.
pub const DEFAULT_RENDER_HEIGHT: u32 = 500;
/// Default inter-frame delay of the decode loop, in milliseconds.
///
/// Pacing is a fixed small delay rather than wall-clock frame timing; a
/// deliberate simplification of this engine's decode loop.
pub const DEFAULT_TICK_DELAY_MS: u64 = 15;
/// Default interval at which a paused worker re-checks its pause flag.
pub const DEFAULT_PAUSE_POLL_MS: u64 = 10;
/// Default number of consecutive failed reads tolerated before the worker
/// declares end-of-stream.
pub const DEFAULT_READ_RETRY_LIMIT: u32 = 10;
/// Default backoff after a failed read, in milliseconds.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 100;

/// Tunable playback parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Width of frames delivered to the renderer sink, in pixels.
    #[serde(default = "default_render_width")]
    pub render_width: u32,

    /// Height of frames delivered to the renderer sink, in pixels.
    #[serde(default = "default_render_height")]
    pub render_height: u32,

    /// Fixed delay inserted after each presented frame, in milliseconds.
    #[serde(default = "default_tick_delay_ms")]
    pub tick_delay_ms: u64,

    /// Poll interval while paused, in milliseconds.
    #[serde(default = "default_pause_poll_ms")]
    pub pause_poll_ms: u64,

    /// Consecutive failed reads tolerated before end-of-stream is declared.
    #[serde(default = "default_read_retry_limit")]
    pub read_retry_limit: u32,

    /// Backoff after a failed read, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_render_width() -> u32 {
    DEFAULT_RENDER_WIDTH
}
fn default_render_height() -> u32 {
    DEFAULT_RENDER_HEIGHT
}
fn default_tick_delay_ms() -> u64 {
    DEFAULT_TICK_DELAY_MS
}
fn default_pause_poll_ms() -> u64 {
    DEFAULT_PAUSE_POLL_MS
}
fn default_read_retry_limit() -> u32 {
    DEFAULT_READ_RETRY_LIMIT
}
fn default_retry_backoff_ms() -> u64 {
    DEFAULT_RETRY_BACKOFF_MS
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            render_width: DEFAULT_RENDER_WIDTH,
            render_height: DEFAULT_RENDER_HEIGHT,
            tick_delay_ms: DEFAULT_TICK_DELAY_MS,
            pause_poll_ms: DEFAULT_PAUSE_POLL_MS,
            read_retry_limit: DEFAULT_READ_RETRY_LIMIT,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl PlayerConfig {
    /// Inter-frame delay as a [`Duration`].
    pub fn tick_delay(&self) -> Duration {
        Duration::from_millis(self.tick_delay_ms)
    }

    /// Pause poll interval as a [`Duration`].
    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }

    /// Failed-read backoff as a [`Duration`].
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

/// Loads the configuration from the platform config directory, falling back
/// to defaults when no file exists.
pub fn load() -> Result<PlayerConfig> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(PlayerConfig::default())
}

/// Saves the configuration to the platform config directory.
pub fn save(config: &PlayerConfig) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Loads the configuration from a specific path.
pub fn load_from_path(path: &Path) -> Result<PlayerConfig> {
    let contents = fs::read_to_string(path)?;
    let config = toml::from_str(&contents)?;
    Ok(config)
}

/// Saves the configuration to a specific path, creating parent directories
/// as needed.
pub fn save_to_path(config: &PlayerConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}

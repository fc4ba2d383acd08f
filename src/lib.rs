// SPDX-License-Identifier: MPL-2.0
//! `prism-player` is an adaptive-quality video playback engine.
//!
//! It plays one piece of content that exists as several pre-encoded quality
//! variants, lets the viewer switch among them without losing the playback
//! position, shows time-synchronized subtitles, and supports pause/resume,
//! all driven by a decode worker that runs independently of the command
//! surface. Rendering, decoding, and subtitle parsing sit behind small
//! traits; FFmpeg and an SRT loader are the bundled implementations.
//!
//! ```no_run
//! use prism_player::config::PlayerConfig;
//! use prism_player::player::{event_channel, PlaybackEngine};
//! use prism_player::source::{QualityLevel, QualityTable};
//! use std::path::Path;
//!
//! # fn main() -> prism_player::Result<()> {
//! let table = QualityTable::new("clip_low.mp4", "clip_medium.mp4", "clip_high.mp4");
//! let (sink, _events) = event_channel();
//!
//! let mut engine = PlaybackEngine::with_ffmpeg(
//!     PlayerConfig::default(),
//!     table,
//!     Some(Path::new("clip.srt")),
//!     sink.clone(),
//!     sink,
//! );
//!
//! engine.play()?;
//! engine.switch_quality(QualityLevel::High)?;
//! engine.stop();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod media;
pub mod player;
pub mod source;
pub mod subtitles;

pub use error::{Error, Result};
pub use player::{PlaybackEngine, PlayerEvent, PlayerState, RendererSink, SubtitleSink};
pub use source::{QualityLevel, QualityTable, SourceId};
pub use subtitles::{SubtitleCue, SubtitleTrack};

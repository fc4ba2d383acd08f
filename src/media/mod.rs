// SPDX-License-Identifier: MPL-2.0
//! The decode capability boundary.
//!
//! The engine never talks to a codec library directly; it drives a
//! [`DecoderPair`] (one video and one audio decode stream bound to a single
//! [`SourceId`]) obtained through the decoder cache. The traits here are
//! the seam at which tests substitute scripted streams and at which the
//! FFmpeg backend plugs in.
//!
//! [`SourceId`]: crate::source::SourceId

mod cache;
mod ffmpeg;

pub use cache::{DecoderCache, MediaCache, SharedCache, SharedPair};
pub use ffmpeg::{probe, FfmpegOpener, MediaInfo};

use crate::error::Result;
use crate::source::SourceId;
use std::sync::Arc;

/// One decoded video frame, already converted for presentation: RGB24
/// pixels at the fixed render target size.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Packed RGB pixel data (width × height × 3 bytes).
    pub rgb: Arc<Vec<u8>>,

    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Presentation timestamp in seconds.
    pub pts_secs: f64,
}

impl VideoFrame {
    /// Total pixel data size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.rgb.len()
    }
}

/// An open video decode stream.
///
/// Implementations deliver frames in source order, pre-converted to the
/// renderer's pixel format and resolution. A failed read returns `None`;
/// the decode loop's bounded retry policy decides whether that was
/// transient or end-of-stream.
pub trait VideoStream: Send {
    /// Reads and converts the next frame. `None` on a failed read.
    fn read_frame(&mut self) -> Option<VideoFrame>;

    /// Repositions the stream so the next read lands at (or just before)
    /// `position_secs`.
    fn seek(&mut self, position_secs: f64) -> Result<()>;
}

/// An open audio decode stream, advanced in lockstep with video.
///
/// The engine does no drift correction: it pulls exactly one audio frame
/// per presented video frame so both streams progress together.
pub trait AudioStream: Send {
    /// Decodes and discards/forwards one audio frame. Returns `false` when
    /// nothing was decoded (suspended, or stream exhausted).
    fn advance(&mut self) -> bool;

    /// Suspends or resumes audio emission. Suspension keeps the stream
    /// open; it only stops it from advancing.
    fn set_suspended(&mut self, suspended: bool);
}

/// Open video + audio decode streams for one source identity.
///
/// Both streams close when the pair is dropped; the decoder cache makes
/// that happen deterministically on `release`, never as a side effect of
/// incidental cleanup.
pub struct DecoderPair {
    pub video: Box<dyn VideoStream>,
    pub audio: Box<dyn AudioStream>,
}

impl DecoderPair {
    pub fn new(video: Box<dyn VideoStream>, audio: Box<dyn AudioStream>) -> Self {
        Self { video, audio }
    }
}

/// Opens decoder pairs for source identities.
///
/// Opening performs real I/O and fails with
/// [`Error::SourceUnavailable`](crate::error::Error::SourceUnavailable)
/// when the identity cannot be resolved to a decodable stream.
pub trait SourceOpener: Send {
    fn open(&self, id: &SourceId) -> Result<DecoderPair>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_frame_reports_size() {
        let frame = VideoFrame {
            rgb: Arc::new(vec![0u8; 800 * 500 * 3]),
            width: 800,
            height: 500,
            pts_secs: 0.0,
        };
        assert_eq!(frame.size_bytes(), 800 * 500 * 3);
    }
}

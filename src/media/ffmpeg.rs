// SPDX-License-Identifier: MPL-2.0
//! FFmpeg-backed decode streams.
//!
//! One [`FfmpegOpener`] produces a [`DecoderPair`] per source identity:
//! separate demux contexts for video and audio so each stream advances at
//! its own pace, a software scaler converting decoded video to RGB24 at the
//! fixed render target size, and microsecond-granularity seeks with a
//! decoder flush.

use crate::error::{Error, Result};
use crate::media::{AudioStream, DecoderPair, SourceOpener, VideoFrame, VideoStream};
use crate::source::SourceId;
use std::path::Path;
use std::sync::{Arc, Once};

/// Static flag to ensure FFmpeg is initialized only once.
static FFMPEG_INIT: Once = Once::new();

/// Initialize FFmpeg with the log level turned down.
///
/// Safe to call multiple times; initialization happens once.
fn init_ffmpeg() -> Result<()> {
    let mut init_result: Result<()> = Ok(());

    FFMPEG_INIT.call_once(|| {
        if let Err(e) = ffmpeg_next::init() {
            init_result = Err(Error::SourceUnavailable(format!(
                "FFmpeg initialization failed: {e}"
            )));
            return;
        }

        // SAFETY: av_log_set_level is thread-safe and only affects logging
        unsafe {
            ffmpeg_next::ffi::av_log_set_level(ffmpeg_next::ffi::AV_LOG_ERROR);
        }
    });

    init_result
}

/// Opens FFmpeg decoder pairs, converting video to a fixed output size.
pub struct FfmpegOpener {
    render_width: u32,
    render_height: u32,
}

impl FfmpegOpener {
    /// Creates an opener whose video streams deliver RGB24 frames at
    /// `render_width` × `render_height`.
    pub fn new(render_width: u32, render_height: u32) -> Self {
        Self {
            render_width,
            render_height,
        }
    }
}

impl SourceOpener for FfmpegOpener {
    fn open(&self, id: &SourceId) -> Result<DecoderPair> {
        init_ffmpeg()?;

        let path = Path::new(id.as_str());
        let video = FfmpegVideoStream::open(path, self.render_width, self.render_height)?;
        let audio: Box<dyn AudioStream> = match FfmpegAudioStream::open(path)? {
            Some(stream) => Box::new(stream),
            None => {
                tracing::debug!(source = %id, "no audio stream, playing silent");
                Box::new(SilentAudioStream)
            }
        };

        Ok(DecoderPair::new(Box::new(video), audio))
    }
}

/// Video demuxer + decoder + scaler for one source.
struct FfmpegVideoStream {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    /// Stream time base, in seconds per PTS unit.
    time_base: f64,
    eof_sent: bool,
}

// SAFETY: the stream is only ever driven from one thread at a time; the
// decode worker owns it behind the pair mutex. The raw FFmpeg pointers are
// not shared across threads concurrently.
unsafe impl Send for FfmpegVideoStream {}

impl FfmpegVideoStream {
    fn open(path: &Path, render_width: u32, render_height: u32) -> Result<Self> {
        let input = ffmpeg_next::format::input(&path)
            .map_err(|e| Error::SourceUnavailable(format!("Failed to open video: {e}")))?;

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| Error::SourceUnavailable("No video stream found".to_string()))?;
        let stream_index = stream.index();

        let time_base = stream.time_base();
        let time_base = f64::from(time_base.numerator()) / f64::from(time_base.denominator());

        let context_decoder =
            ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
                .map_err(|e| Error::SourceUnavailable(format!("Failed to create codec context: {e}")))?;
        let decoder = context_decoder
            .decoder()
            .video()
            .map_err(|e| Error::SourceUnavailable(format!("Failed to create video decoder: {e}")))?;

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(Error::SourceUnavailable(format!(
                "Invalid video dimensions: {width}x{height}"
            )));
        }

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            render_width,
            render_height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| Error::SourceUnavailable(format!("Failed to create scaler: {e}")))?;

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            time_base,
            eof_sent: false,
        })
    }

    /// Feeds the decoder one packet from the video stream. Returns `false`
    /// once the demuxer is exhausted and end-of-stream has been signalled.
    fn feed_packet(&mut self) -> bool {
        for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }
            match self.decoder.send_packet(&packet) {
                Ok(()) => return true,
                Err(e) => {
                    tracing::debug!("packet send failed, skipping: {e}");
                    continue;
                }
            }
        }

        if !self.eof_sent {
            self.eof_sent = true;
            let _ = self.decoder.send_eof();
            // Let receive_frame drain whatever is still buffered
            return true;
        }
        false
    }
}

impl VideoStream for FfmpegVideoStream {
    fn read_frame(&mut self) -> Option<VideoFrame> {
        let mut decoded = ffmpeg_next::frame::Video::empty();

        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    let pts_secs = decoded
                        .timestamp()
                        .map(|ts| ts as f64 * self.time_base)
                        .unwrap_or(0.0);

                    let mut rgb = ffmpeg_next::frame::Video::empty();
                    if let Err(e) = self.scaler.run(&decoded, &mut rgb) {
                        tracing::debug!("frame conversion failed: {e}");
                        return None;
                    }

                    return Some(VideoFrame {
                        width: rgb.width(),
                        height: rgb.height(),
                        rgb: Arc::new(extract_rgb_data(&rgb)),
                        pts_secs,
                    });
                }
                Err(ffmpeg_next::Error::Eof) => return None,
                Err(ffmpeg_next::Error::Other { errno })
                    if errno == ffmpeg_next::error::EAGAIN =>
                {
                    if !self.feed_packet() {
                        return None;
                    }
                }
                Err(e) => {
                    tracing::debug!("video decode failed: {e}");
                    return None;
                }
            }
        }
    }

    fn seek(&mut self, position_secs: f64) -> Result<()> {
        // input.seek expects AV_TIME_BASE (microsecond) timestamps; the
        // RangeTo bound lets FFmpeg step back to the preceding keyframe.
        let timestamp = (position_secs * 1_000_000.0) as i64;
        self.input
            .seek(timestamp, ..timestamp)
            .map_err(|e| Error::SourceUnavailable(format!("Seek failed: {e}")))?;
        self.decoder.flush();
        self.eof_sent = false;
        Ok(())
    }
}

/// Extracts packed RGB24 data from a scaled frame, handling stride.
fn extract_rgb_data(frame: &ffmpeg_next::frame::Video) -> Vec<u8> {
    let width = frame.width();
    let height = frame.height();
    let data = frame.data(0);
    let stride = frame.stride(0);

    let mut rgb_bytes = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        let row_start = y as usize * stride;
        let row_end = row_start + (width * 3) as usize;
        rgb_bytes.extend_from_slice(&data[row_start..row_end]);
    }

    rgb_bytes
}

/// Audio demuxer + decoder for one source.
struct FfmpegAudioStream {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Audio,
    stream_index: usize,
    suspended: bool,
    eof_sent: bool,
}

// SAFETY: same single-thread discipline as FfmpegVideoStream; the pair
// mutex serializes all access.
unsafe impl Send for FfmpegAudioStream {}

impl FfmpegAudioStream {
    /// Opens the audio side of a source. `Ok(None)` when the source has no
    /// audio stream.
    fn open(path: &Path) -> Result<Option<Self>> {
        let input = ffmpeg_next::format::input(&path)
            .map_err(|e| Error::SourceUnavailable(format!("Failed to open audio: {e}")))?;

        let Some(stream) = input.streams().best(ffmpeg_next::media::Type::Audio) else {
            return Ok(None);
        };
        let stream_index = stream.index();

        let context_decoder =
            ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
                .map_err(|e| Error::SourceUnavailable(format!("Failed to create codec context: {e}")))?;
        let decoder = context_decoder
            .decoder()
            .audio()
            .map_err(|e| Error::SourceUnavailable(format!("Failed to create audio decoder: {e}")))?;

        Ok(Some(Self {
            input,
            decoder,
            stream_index,
            suspended: false,
            eof_sent: false,
        }))
    }

    fn feed_packet(&mut self) -> bool {
        for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }
            match self.decoder.send_packet(&packet) {
                Ok(()) => return true,
                Err(e) => {
                    tracing::debug!("audio packet send failed, skipping: {e}");
                    continue;
                }
            }
        }

        if !self.eof_sent {
            self.eof_sent = true;
            let _ = self.decoder.send_eof();
            return true;
        }
        false
    }
}

impl AudioStream for FfmpegAudioStream {
    fn advance(&mut self) -> bool {
        if self.suspended {
            return false;
        }

        let mut decoded = ffmpeg_next::frame::Audio::empty();
        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => return true,
                Err(ffmpeg_next::Error::Eof) => return false,
                Err(ffmpeg_next::Error::Other { errno })
                    if errno == ffmpeg_next::error::EAGAIN =>
                {
                    if !self.feed_packet() {
                        return false;
                    }
                }
                Err(e) => {
                    tracing::debug!("audio decode failed: {e}");
                    return false;
                }
            }
        }
    }

    fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }
}

/// Stand-in for sources without an audio track.
struct SilentAudioStream;

impl AudioStream for SilentAudioStream {
    fn advance(&mut self) -> bool {
        false
    }

    fn set_suspended(&mut self, _suspended: bool) {}
}

/// Stream properties of a source, read without decoding frames.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub width: u32,
    pub height: u32,
    /// Duration in seconds; 0 when the container does not report one.
    pub duration_secs: f64,
    pub fps: f64,
    pub has_audio: bool,
}

/// Probes a source for its stream properties.
pub fn probe<P: AsRef<Path>>(path: P) -> Result<MediaInfo> {
    init_ffmpeg()?;

    let input = ffmpeg_next::format::input(&path)
        .map_err(|e| Error::SourceUnavailable(format!("Failed to open video: {e}")))?;

    let stream = input
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or_else(|| Error::SourceUnavailable("No video stream found".to_string()))?;

    let context_decoder =
        ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| Error::SourceUnavailable(format!("Failed to create codec context: {e}")))?;
    let decoder = context_decoder
        .decoder()
        .video()
        .map_err(|e| Error::SourceUnavailable(format!("Failed to create video decoder: {e}")))?;

    let width = decoder.width();
    let height = decoder.height();
    if width == 0 || height == 0 {
        return Err(Error::SourceUnavailable(format!(
            "Invalid video dimensions: {width}x{height}"
        )));
    }

    let duration_secs = if stream.duration() > 0 {
        let time_base = stream.time_base();
        stream.duration() as f64 * f64::from(time_base.numerator())
            / f64::from(time_base.denominator())
    } else if input.duration() > 0 {
        input.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE)
    } else {
        0.0
    };

    let fps = {
        let frame_rate = stream.avg_frame_rate();
        if frame_rate.denominator() == 0 {
            0.0
        } else {
            f64::from(frame_rate.numerator()) / f64::from(frame_rate.denominator())
        }
    };

    let has_audio = input
        .streams()
        .best(ffmpeg_next::media::Type::Audio)
        .is_some();

    Ok(MediaInfo {
        width,
        height,
        duration_secs,
        fps,
        has_audio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_fails_for_nonexistent_source() {
        let opener = FfmpegOpener::new(800, 500);
        let result = opener.open(&SourceId::from("/nonexistent/video.mp4"));
        assert!(matches!(result, Err(Error::SourceUnavailable(_))));
    }

    #[test]
    fn probe_fails_for_nonexistent_source() {
        let result = probe("/nonexistent/video.mp4");
        assert!(matches!(result, Err(Error::SourceUnavailable(_))));
    }

    #[test]
    fn open_fails_for_garbage_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.mp4");
        std::fs::write(&path, b"not actually a video").unwrap();

        let opener = FfmpegOpener::new(800, 500);
        let result = opener.open(&SourceId::new(path.to_string_lossy().into_owned()));
        assert!(result.is_err());
    }
}

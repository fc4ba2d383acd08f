// SPDX-License-Identifier: MPL-2.0
//! The playback engine: command surface, state machine, and the seamless
//! quality-switch path.
//!
//! [`PlaybackEngine`] composes a subtitle track, a decoder cache, and the
//! two output sinks as plain fields; there is no wrapper/decorator layering
//! and no global state. Commands are serialized by `&mut self`, so the
//! transition table is never evaluated concurrently; the decode worker is
//! the only other thread, and the engine joins it before reopening a
//! source identity the worker may still be reading from.

mod clock;
mod sinks;
mod state;
mod worker;

pub use clock::{PositionClock, SharedPositionClock};
pub use sinks::{event_channel, EventSink, PlayerEvent, RendererSink, SubtitleSink};
pub use state::PlayerState;

use crate::config::PlayerConfig;
use crate::error::Result;
use crate::media::{DecoderCache, FfmpegOpener, MediaCache, SharedCache, SharedPair};
use crate::source::{QualityLevel, QualityTable};
use crate::subtitles::SubtitleTrack;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use worker::{Worker, WorkerContext};

/// Adaptive playback engine.
///
/// Owns the current [`PlayerState`] and at most one decode worker. Every
/// command returns immediately; decoding and presentation happen on the
/// worker thread. Commands that are illegal in the current state are
/// absorbed silently so the surface is always safe to call from UI code.
pub struct PlaybackEngine {
    config: PlayerConfig,
    qualities: QualityTable,
    current_quality: QualityLevel,
    subtitles: Arc<SubtitleTrack>,
    cache: SharedCache,
    renderer: Arc<dyn RendererSink>,
    subtitle_sink: Arc<dyn SubtitleSink>,
    position: SharedPositionClock,
    state: PlayerState,
    worker: Option<Worker>,
    /// Kept alongside the worker so pause/resume can reach the audio stream.
    session_pair: Option<SharedPair>,
}

impl PlaybackEngine {
    /// Creates an engine over an injected cache and sinks.
    ///
    /// The initial quality level is Medium and the initial state is
    /// [`PlayerState::Stopped`].
    pub fn new(
        config: PlayerConfig,
        qualities: QualityTable,
        subtitles: SubtitleTrack,
        cache: Box<dyn MediaCache>,
        renderer: Arc<dyn RendererSink>,
        subtitle_sink: Arc<dyn SubtitleSink>,
    ) -> Self {
        Self {
            config,
            qualities,
            current_quality: QualityLevel::Medium,
            subtitles: Arc::new(subtitles),
            cache: Arc::new(Mutex::new(cache)),
            renderer,
            subtitle_sink,
            position: Arc::new(PositionClock::new()),
            state: PlayerState::Stopped,
            worker: None,
            session_pair: None,
        }
    }

    /// Creates an FFmpeg-backed engine.
    ///
    /// Subtitle loading is best-effort: a parse failure logs a warning and
    /// playback proceeds with an empty track.
    pub fn with_ffmpeg(
        config: PlayerConfig,
        qualities: QualityTable,
        subtitle_path: Option<&Path>,
        renderer: Arc<dyn RendererSink>,
        subtitle_sink: Arc<dyn SubtitleSink>,
    ) -> Self {
        let subtitles = match subtitle_path {
            Some(path) => match SubtitleTrack::load_srt(path) {
                Ok(track) => track,
                Err(e) => {
                    tracing::warn!("subtitles disabled: {e}");
                    SubtitleTrack::empty()
                }
            },
            None => SubtitleTrack::empty(),
        };

        let opener = FfmpegOpener::new(config.render_width, config.render_height);
        let cache = DecoderCache::new(Box::new(opener));
        Self::new(
            config,
            qualities,
            subtitles,
            Box::new(cache),
            renderer,
            subtitle_sink,
        )
    }

    // =========================================================================
    // Command surface
    // =========================================================================

    /// Starts playback of the current quality level from the beginning.
    ///
    /// No-op while already playing. From `Paused` this is a fresh session,
    /// not a resume.
    pub fn play(&mut self) -> Result<()> {
        self.play_from(0.0)
    }

    /// Starts playback from `resume_secs` into the content.
    pub fn play_from(&mut self, resume_secs: f64) -> Result<()> {
        self.reap_finished_worker();
        match self.state {
            PlayerState::Playing => Ok(()),
            PlayerState::Stopped | PlayerState::Paused => self.start_session(resume_secs),
        }
    }

    /// Suspends frame advancement, holding the current position.
    ///
    /// No-op unless playing.
    pub fn pause(&mut self) {
        self.reap_finished_worker();
        if !self.state.is_playing() {
            return;
        }

        if let Some(worker) = &self.worker {
            worker.set_paused(true);
        }
        if let Some(pair) = &self.session_pair {
            pair.lock().audio.set_suspended(true);
        }
        self.state = PlayerState::Paused;
        tracing::debug!("playback paused");
    }

    /// Continues a paused session from the held position, without re-seeking.
    ///
    /// No-op unless paused.
    pub fn resume(&mut self) {
        self.reap_finished_worker();
        if !self.state.is_paused() {
            return;
        }

        if let Some(pair) = &self.session_pair {
            pair.lock().audio.set_suspended(false);
        }
        if let Some(worker) = &self.worker {
            worker.set_paused(false);
        }
        self.state = PlayerState::Playing;
        tracing::debug!("playback resumed");
    }

    /// Ends the session: joins the worker (which releases the decoder pair)
    /// and clears position tracking.
    ///
    /// No-op while stopped. Callers that need the last position snapshot it
    /// before stopping, as the quality-switch path does.
    pub fn stop(&mut self) {
        self.reap_finished_worker();
        if !self.state.has_session() {
            return;
        }

        self.teardown_session();
        self.position.reset();
        tracing::info!("playback stopped");
    }

    /// Switches to another quality variant, keeping the playback position.
    ///
    /// Captures the current position (0 when stopped), tears the session
    /// down, and starts a new one on the new variant at the captured
    /// position. Switching to the already-active level restarts playback at
    /// the same position.
    pub fn switch_quality(&mut self, level: QualityLevel) -> Result<()> {
        self.reap_finished_worker();

        let resume_secs = if self.state.has_session() {
            self.position.get()
        } else {
            0.0
        };

        let previous = self.current_quality;
        self.current_quality = level;
        self.stop();

        tracing::info!(from = %previous, to = %level, resume_secs, "switching quality");
        self.play_from(resume_secs)
    }

    // =========================================================================
    // State queries
    // =========================================================================

    /// Current state. Reports `Stopped` as soon as the worker has ended a
    /// session on its own (end-of-stream), even before the next command
    /// reaps the thread.
    pub fn state(&self) -> PlayerState {
        if self.state.has_session() && self.worker.as_ref().is_some_and(|w| w.is_finished()) {
            PlayerState::Stopped
        } else {
            self.state
        }
    }

    /// Current playback position in seconds.
    pub fn position_secs(&self) -> f64 {
        self.position.get()
    }

    /// The active quality level.
    pub fn current_quality(&self) -> QualityLevel {
        self.current_quality
    }

    /// The label → identity table supplied at construction.
    pub fn qualities(&self) -> &QualityTable {
        &self.qualities
    }

    /// The loaded subtitle track (empty when loading failed or none was given).
    pub fn subtitles(&self) -> &SubtitleTrack {
        &self.subtitles
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    fn start_session(&mut self, resume_secs: f64) -> Result<()> {
        // A paused session restarts from scratch; the old worker must have
        // fully released its pair before the same identity is reopened.
        self.teardown_session();

        let id = self.qualities.source(self.current_quality).clone();
        let pair = {
            let mut cache = self.cache.lock();
            // Reset-on-demand: never resume onto a pair left over from an
            // earlier session of this identity.
            cache.release(&id);
            cache.acquire(&id)?
        };

        if resume_secs > 0.0 {
            if let Err(e) = pair.lock().video.seek(resume_secs) {
                self.cache.lock().release(&id);
                return Err(e);
            }
        }

        self.position.set(resume_secs.max(0.0));
        let worker = Worker::spawn(WorkerContext {
            source: id.clone(),
            pair: Arc::clone(&pair),
            cache: Arc::clone(&self.cache),
            subtitles: Arc::clone(&self.subtitles),
            renderer: Arc::clone(&self.renderer),
            subtitle_sink: Arc::clone(&self.subtitle_sink),
            position: Arc::clone(&self.position),
            tick_delay: self.config.tick_delay(),
            pause_poll: self.config.pause_poll(),
            retry_limit: self.config.read_retry_limit,
            retry_backoff: self.config.retry_backoff(),
        });

        self.session_pair = Some(pair);
        self.worker = Some(worker);
        self.state = PlayerState::Playing;
        tracing::info!(source = %id, quality = %self.current_quality, resume_secs, "playback started");
        Ok(())
    }

    /// Joins any live worker and drops the session pair handle. The worker's
    /// exit path is what releases the pair through the cache.
    fn teardown_session(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop_and_join();
        }
        self.session_pair = None;
        self.state = PlayerState::Stopped;
    }

    /// Completes the internal stop of a worker that exited on its own
    /// (end-of-stream): join the thread, clear the session, reset position.
    fn reap_finished_worker(&mut self) {
        if self.worker.as_ref().is_some_and(|w| w.is_finished()) {
            self.teardown_session();
            self.position.reset();
            tracing::debug!("reaped finished decode worker");
        }
    }
}

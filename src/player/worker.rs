// SPDX-License-Identifier: MPL-2.0
//! The decode/render worker.
//!
//! One worker thread exists per playback session. Each tick it reads a
//! converted frame from the decoder pair, presents it, advances the audio
//! stream in lockstep, publishes the frame timestamp to the position clock,
//! and pushes the subtitle text for exactly that timestamp.
//!
//! Pacing is a fixed inter-frame delay, not wall-clock frame timing. That
//! is a known fidelity limit carried over from the design this engine
//! replaces; callers that need accurate timing would pace in their renderer.
//!
//! Failed reads are tolerated up to a bound of consecutive attempts with a
//! short backoff; exhausting the bound declares end-of-stream. However the
//! loop exits (end-of-stream, a stop command, or engine teardown), its
//! exit path releases the session's decoder pair through the cache exactly
//! once.

use crate::media::{SharedCache, SharedPair};
use crate::player::clock::SharedPositionClock;
use crate::player::sinks::{RendererSink, SubtitleSink};
use crate::source::SourceId;
use crate::subtitles::SubtitleTrack;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Everything a worker thread needs for one session.
pub(crate) struct WorkerContext {
    pub source: SourceId,
    pub pair: SharedPair,
    pub cache: SharedCache,
    pub subtitles: Arc<SubtitleTrack>,
    pub renderer: Arc<dyn RendererSink>,
    pub subtitle_sink: Arc<dyn SubtitleSink>,
    pub position: SharedPositionClock,
    pub tick_delay: Duration,
    pub pause_poll: Duration,
    pub retry_limit: u32,
    pub retry_backoff: Duration,
}

enum ExitReason {
    Commanded,
    EndOfStream,
}

/// Handle to a running decode worker.
pub(crate) struct Worker {
    stop: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawns the worker thread for a session.
    pub fn spawn(ctx: WorkerContext) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let paused = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let thread_stop = Arc::clone(&stop);
        let thread_paused = Arc::clone(&paused);
        let thread_finished = Arc::clone(&finished);
        let handle = std::thread::spawn(move || {
            run(ctx, &thread_stop, &thread_paused, &thread_finished);
        });

        Self {
            stop,
            paused,
            finished,
            handle: Some(handle),
        }
    }

    /// Suspends or resumes frame advancement. The thread keeps running and
    /// observes the change within one poll interval.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    /// True once the thread has run its exit path (pair released).
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Signals the worker to stop and blocks until its exit path has run.
    pub fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn run(ctx: WorkerContext, stop: &AtomicBool, paused: &AtomicBool, finished: &AtomicBool) {
    let mut consecutive_failures: u32 = 0;
    let mut reason = ExitReason::Commanded;

    loop {
        if stop.load(Ordering::Acquire) {
            break;
        }

        if paused.load(Ordering::Acquire) {
            std::thread::sleep(ctx.pause_poll);
            continue;
        }

        let frame = ctx.pair.lock().video.read_frame();
        match frame {
            Some(frame) => {
                consecutive_failures = 0;
                let pts_secs = frame.pts_secs;

                ctx.renderer.present(frame);
                ctx.pair.lock().audio.advance();
                ctx.position.set(pts_secs);
                ctx.subtitle_sink.set_text(ctx.subtitles.active_text(pts_secs));

                std::thread::sleep(ctx.tick_delay);
            }
            None => {
                consecutive_failures += 1;
                if consecutive_failures > ctx.retry_limit {
                    reason = ExitReason::EndOfStream;
                    break;
                }
                std::thread::sleep(ctx.retry_backoff);
            }
        }
    }

    match reason {
        ExitReason::Commanded => {
            tracing::debug!(source = %ctx.source, "decode worker stopped on command");
        }
        ExitReason::EndOfStream => {
            tracing::info!(
                source = %ctx.source,
                failures = consecutive_failures,
                "end of stream, decode worker exiting"
            );
        }
    }

    // Sole release point for this session's pair, on every exit path.
    ctx.cache.lock().release(&ctx.source);
    finished.store(true, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::media::{
        AudioStream, DecoderPair, MediaCache, VideoFrame, VideoStream,
    };
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    /// Yields scripted read outcomes, then `None` forever.
    struct ScriptedVideo {
        script: VecDeque<Option<f64>>,
    }

    impl VideoStream for ScriptedVideo {
        fn read_frame(&mut self) -> Option<VideoFrame> {
            self.script.pop_front().flatten().map(|pts_secs| VideoFrame {
                rgb: Arc::new(vec![0u8; 12]),
                width: 2,
                height: 2,
                pts_secs,
            })
        }

        fn seek(&mut self, _position_secs: f64) -> Result<()> {
            Ok(())
        }
    }

    struct NullAudio;
    impl AudioStream for NullAudio {
        fn advance(&mut self) -> bool {
            false
        }
        fn set_suspended(&mut self, _suspended: bool) {}
    }

    struct CountingCache {
        releases: Arc<AtomicUsize>,
    }

    impl MediaCache for CountingCache {
        fn acquire(&mut self, _id: &SourceId) -> Result<SharedPair> {
            unreachable!("worker tests never acquire");
        }
        fn release(&mut self, _id: &SourceId) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct RecordingRenderer {
        pts: Mutex<Vec<f64>>,
    }
    impl RendererSink for RecordingRenderer {
        fn present(&self, frame: VideoFrame) {
            self.pts.lock().push(frame.pts_secs);
        }
    }

    struct NullSubtitleSink;
    impl SubtitleSink for NullSubtitleSink {
        fn set_text(&self, _text: &str) {}
    }

    fn context(
        script: Vec<Option<f64>>,
        retry_limit: u32,
        releases: Arc<AtomicUsize>,
        renderer: Arc<RecordingRenderer>,
    ) -> WorkerContext {
        let pair = Arc::new(Mutex::new(DecoderPair::new(
            Box::new(ScriptedVideo {
                script: script.into(),
            }),
            Box::new(NullAudio),
        )));
        let cache: SharedCache = Arc::new(Mutex::new(Box::new(CountingCache { releases })));
        WorkerContext {
            source: SourceId::from("test.mp4"),
            pair,
            cache,
            subtitles: Arc::new(SubtitleTrack::empty()),
            renderer,
            subtitle_sink: Arc::new(NullSubtitleSink),
            position: Arc::new(crate::player::clock::PositionClock::new()),
            tick_delay: Duration::from_millis(1),
            pause_poll: Duration::from_millis(1),
            retry_limit,
            retry_backoff: Duration::from_millis(1),
        }
    }

    fn wait_until_finished(worker: &Worker) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !worker.is_finished() {
            assert!(Instant::now() < deadline, "worker did not finish in time");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn failures_below_bound_recover() {
        let releases = Arc::new(AtomicUsize::new(0));
        let renderer = Arc::new(RecordingRenderer {
            pts: Mutex::new(Vec::new()),
        });

        // 5 consecutive failures with a bound of 10, then frames again
        let mut script = vec![Some(1.0)];
        script.extend(vec![None; 5]);
        script.push(Some(2.0));

        let mut worker = Worker::spawn(context(script, 10, releases, Arc::clone(&renderer)));
        // Exhausts the script (11 more failures) and exits on its own
        wait_until_finished(&worker);
        worker.stop_and_join();

        assert_eq!(*renderer.pts.lock(), vec![1.0, 2.0]);
    }

    #[test]
    fn exceeding_retry_bound_declares_end_of_stream() {
        let releases = Arc::new(AtomicUsize::new(0));
        let renderer = Arc::new(RecordingRenderer {
            pts: Mutex::new(Vec::new()),
        });

        let script = vec![Some(1.0)];
        let mut worker = Worker::spawn(context(
            script,
            3,
            Arc::clone(&releases),
            Arc::clone(&renderer),
        ));

        wait_until_finished(&worker);
        worker.stop_and_join();

        assert_eq!(renderer.pts.lock().len(), 1);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stop_releases_exactly_once() {
        let releases = Arc::new(AtomicUsize::new(0));
        let renderer = Arc::new(RecordingRenderer {
            pts: Mutex::new(Vec::new()),
        });

        // Endless stream of frames
        let script: Vec<Option<f64>> = (0..10_000).map(|i| Some(i as f64)).collect();
        let mut worker = Worker::spawn(context(
            script,
            10,
            Arc::clone(&releases),
            Arc::clone(&renderer),
        ));

        std::thread::sleep(Duration::from_millis(20));
        worker.stop_and_join();
        // A second stop must not release again
        worker.stop_and_join();

        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn paused_worker_does_not_advance() {
        let releases = Arc::new(AtomicUsize::new(0));
        let renderer = Arc::new(RecordingRenderer {
            pts: Mutex::new(Vec::new()),
        });

        let script: Vec<Option<f64>> = (0..10_000).map(|i| Some(i as f64)).collect();
        let mut worker = Worker::spawn(context(
            script,
            10,
            releases,
            Arc::clone(&renderer),
        ));

        std::thread::sleep(Duration::from_millis(20));
        worker.set_paused(true);
        std::thread::sleep(Duration::from_millis(20));
        let frozen = renderer.pts.lock().len();
        std::thread::sleep(Duration::from_millis(30));
        // At most one in-flight frame may land after the pause flag flips
        assert!(renderer.pts.lock().len() <= frozen + 1);

        worker.set_paused(false);
        std::thread::sleep(Duration::from_millis(20));
        assert!(renderer.pts.lock().len() > frozen);

        worker.stop_and_join();
    }
}

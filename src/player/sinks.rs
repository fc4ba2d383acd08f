// SPDX-License-Identifier: MPL-2.0
//! Output boundaries of the decode loop.
//!
//! The worker pushes every converted frame into a [`RendererSink`] and the
//! matching subtitle text into a [`SubtitleSink`], once per tick. Both are
//! expected to accept near-immediately; slow consumers should buffer on
//! their side. [`EventSink`] adapts both traits onto a channel for UI
//! layers that prefer pulling `PlayerEvent`s from a receiver.

use crate::media::VideoFrame;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Consumes converted video frames, in source order.
pub trait RendererSink: Send + Sync {
    fn present(&self, frame: VideoFrame);
}

/// Consumes the per-tick subtitle text.
///
/// Called every tick, including with an empty string to clear the display.
pub trait SubtitleSink: Send + Sync {
    fn set_text(&self, text: &str);
}

/// Events sent from the decode worker to the UI.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// A new frame is ready for display.
    Frame(VideoFrame),

    /// The subtitle text to show (empty to clear).
    Subtitle(String),
}

/// Channel-backed sink: every `present`/`set_text` becomes a [`PlayerEvent`].
///
/// Sends never block; if the receiver is gone the events are dropped, which
/// lets the worker run to its own stop condition regardless of UI lifetime.
pub struct EventSink {
    tx: mpsc::UnboundedSender<PlayerEvent>,
}

/// Creates a connected [`EventSink`] / receiver pair.
pub fn event_channel() -> (Arc<EventSink>, mpsc::UnboundedReceiver<PlayerEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(EventSink { tx }), rx)
}

impl RendererSink for EventSink {
    fn present(&self, frame: VideoFrame) {
        let _ = self.tx.send(PlayerEvent::Frame(frame));
    }
}

impl SubtitleSink for EventSink {
    fn set_text(&self, text: &str) {
        let _ = self.tx.send(PlayerEvent::Subtitle(text.to_string()));
    }
}

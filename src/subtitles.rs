// SPDX-License-Identifier: MPL-2.0
//! Subtitle tracks: an ordered, immutable cue list with timing-based lookup.
//!
//! Tracks are loaded once (the default loader parses SRT) and then only
//! queried. [`SubtitleTrack::active_text`] is a pure function over the cue
//! list, safe to call with arbitrary, non-monotonic positions; the decode
//! loop calls it every tick, including across seeks.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// A timestamped subtitle interval.
///
/// Timestamps are in seconds. A cue is active for any query time `t` with
/// `start <= t <= end` (both ends inclusive).
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// An immutable, ordered sequence of subtitle cues.
///
/// Cues are sorted by start time at load; ties keep file order. When cues
/// overlap, the first cue in sequence order wins; callers must not rely on
/// anything beyond "first match".
#[derive(Debug, Clone, Default)]
pub struct SubtitleTrack {
    cues: Vec<SubtitleCue>,
}

impl SubtitleTrack {
    /// A track with no cues; every lookup returns the empty string.
    pub fn empty() -> Self {
        Self { cues: Vec::new() }
    }

    /// Builds a track from pre-parsed cues, sorting them by start time.
    pub fn from_cues(mut cues: Vec<SubtitleCue>) -> Self {
        cues.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self { cues }
    }

    /// Loads an SRT file from disk.
    pub fn load_srt<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| Error::SubtitleParse(format!("Failed to read subtitle file: {e}")))?;
        Self::from_srt(&contents)
    }

    /// Parses SRT content.
    ///
    /// Blocks are separated by blank lines; each block carries an optional
    /// index line, a `HH:MM:SS,mmm --> HH:MM:SS,mmm` timing line, and one or
    /// more text lines. Blocks without any timing line are skipped, but a
    /// timing line that fails to parse is an error.
    pub fn from_srt(content: &str) -> Result<Self> {
        let content = content.replace("\r\n", "\n");
        let mut cues = Vec::new();

        for block in content.split("\n\n") {
            let block = block.trim();
            if block.is_empty() {
                continue;
            }

            let lines: Vec<&str> = block.lines().collect();
            let Some(timing_idx) = lines.iter().position(|line| line.contains("-->")) else {
                continue;
            };

            let (start, end) = parse_timing(lines[timing_idx])?;
            let text = lines[timing_idx + 1..].join("\n");
            if !text.is_empty() {
                cues.push(SubtitleCue { start, end, text });
            }
        }

        Ok(Self::from_cues(cues))
    }

    /// Returns the text of the first cue whose interval contains `position_secs`,
    /// or the empty string when no cue is active.
    pub fn active_text(&self, position_secs: f64) -> &str {
        self.cues
            .iter()
            .find(|cue| cue.start <= position_secs && position_secs <= cue.end)
            .map(|cue| cue.text.as_str())
            .unwrap_or("")
    }

    pub fn cues(&self) -> &[SubtitleCue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

/// Parses an SRT timing line: `00:00:01,000 --> 00:00:04,000`.
fn parse_timing(line: &str) -> Result<(f64, f64)> {
    let (start_str, end_str) = line
        .split_once("-->")
        .ok_or_else(|| Error::SubtitleParse(format!("Missing '-->' in timing line: {line}")))?;

    let start = parse_timestamp(start_str.trim())?;
    let end = parse_timestamp(end_str.trim())?;
    Ok((start, end))
}

/// Parses an SRT timestamp (`HH:MM:SS,mmm`; a period also works as the
/// millisecond separator) into seconds.
fn parse_timestamp(s: &str) -> Result<f64> {
    let normalized = s.replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();

    let (hours, minutes, seconds_str) = match parts.len() {
        2 => ("0", parts[0], parts[1]),
        3 => (parts[0], parts[1], parts[2]),
        _ => {
            return Err(Error::SubtitleParse(format!("Invalid timestamp: {s}")));
        }
    };

    let hours: u64 = hours
        .parse()
        .map_err(|_| Error::SubtitleParse(format!("Invalid timestamp: {s}")))?;
    let minutes: u64 = minutes
        .parse()
        .map_err(|_| Error::SubtitleParse(format!("Invalid timestamp: {s}")))?;
    let seconds: f64 = seconds_str
        .parse()
        .map_err(|_| Error::SubtitleParse(format!("Invalid timestamp: {s}")))?;

    Ok((hours * 3600 + minutes * 60) as f64 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(start: f64, end: f64, text: &str) -> SubtitleCue {
        SubtitleCue {
            start,
            end,
            text: text.to_string(),
        }
    }

    #[test]
    fn parses_timestamps() {
        assert!((parse_timestamp("00:01:23,456").unwrap() - 83.456).abs() < 1e-9);
        assert_eq!(parse_timestamp("01:00:00,000").unwrap(), 3600.0);
        // Minute-second short form
        assert!((parse_timestamp("01:23,456").unwrap() - 83.456).abs() < 1e-9);
    }

    #[test]
    fn rejects_malformed_timestamps() {
        assert!(parse_timestamp("abc").is_err());
        assert!(parse_timestamp("1:2:3:4").is_err());
        assert!(SubtitleTrack::from_srt("1\n00:00:xx,000 --> 00:00:02,000\nHi\n").is_err());
    }

    #[test]
    fn parses_srt_blocks() {
        let srt = "1\n00:00:01,000 --> 00:00:04,000\nFirst subtitle\n\n\
                   2\n00:00:05,000 --> 00:00:08,000\nSecond subtitle\nwith two lines\n";
        let track = SubtitleTrack::from_srt(srt).unwrap();
        assert_eq!(track.len(), 2);
        assert_eq!(track.cues()[0].text, "First subtitle");
        assert_eq!(track.cues()[1].text, "Second subtitle\nwith two lines");
    }

    #[test]
    fn skips_blocks_without_timing_lines() {
        let srt = "garbage header\n\n1\n00:00:01,000 --> 00:00:02,000\nHi\n";
        let track = SubtitleTrack::from_srt(srt).unwrap();
        assert_eq!(track.len(), 1);
    }

    #[test]
    fn empty_content_yields_empty_track() {
        let track = SubtitleTrack::from_srt("").unwrap();
        assert!(track.is_empty());
        assert_eq!(track.active_text(1.0), "");
    }

    #[test]
    fn active_text_inclusive_interval() {
        let track = SubtitleTrack::from_cues(vec![cue(0.0, 2.0, "Hi")]);
        assert_eq!(track.active_text(0.0), "Hi");
        assert_eq!(track.active_text(1.5), "Hi");
        assert_eq!(track.active_text(2.0), "Hi");
        assert_eq!(track.active_text(3.0), "");
        assert_eq!(track.active_text(-1.0), "");
    }

    #[test]
    fn overlapping_cues_first_match_wins() {
        let track = SubtitleTrack::from_cues(vec![
            cue(1.0, 5.0, "first"),
            cue(2.0, 6.0, "second"),
        ]);
        assert_eq!(track.active_text(3.0), "first");
        assert_eq!(track.active_text(5.5), "second");
    }

    #[test]
    fn lookup_is_safe_at_arbitrary_positions() {
        let track = SubtitleTrack::from_cues(vec![cue(1.0, 2.0, "a"), cue(3.0, 4.0, "b")]);
        // Non-monotonic query order, as seen across seeks
        assert_eq!(track.active_text(3.5), "b");
        assert_eq!(track.active_text(1.5), "a");
        assert_eq!(track.active_text(2.5), "");
        assert_eq!(track.active_text(100.0), "");
    }

    #[test]
    fn from_cues_sorts_by_start() {
        let track = SubtitleTrack::from_cues(vec![cue(3.0, 4.0, "b"), cue(1.0, 2.0, "a")]);
        assert_eq!(track.cues()[0].text, "a");
        assert_eq!(track.cues()[1].text, "b");
    }

    #[test]
    fn load_srt_missing_file_is_parse_error() {
        let result = SubtitleTrack::load_srt("/nonexistent/subs.srt");
        assert!(matches!(result, Err(Error::SubtitleParse(_))));
    }

    #[test]
    fn load_srt_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.srt");
        fs::write(&path, "1\n00:00:00,500 --> 00:00:02,000\nHello\n").unwrap();

        let track = SubtitleTrack::load_srt(&path).unwrap();
        assert_eq!(track.active_text(1.0), "Hello");
    }
}

// SPDX-License-Identifier: MPL-2.0
use std::fmt;

/// Crate-wide error type.
///
/// Playback is designed so that most failures never reach the caller:
/// transient decode failures are absorbed by the worker's retry policy and
/// end-of-stream is a normal terminal condition. What remains is the
/// inability to open or seek a source, subtitle load failures, and the
/// usual configuration/I/O plumbing.
#[derive(Debug, Clone)]
pub enum Error {
    /// A source identity could not be opened or seeked. The engine stays in
    /// (or reverts to) the stopped state when this is returned.
    SourceUnavailable(String),

    /// A subtitle source could not be parsed. Surfaced once at load time;
    /// playback itself proceeds without subtitles.
    SubtitleParse(String),

    /// Configuration could not be read or written.
    Config(String),

    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SourceUnavailable(msg) => write!(f, "Source unavailable: {msg}"),
            Error::SubtitleParse(msg) => write!(f, "Subtitle parse error: {msg}"),
            Error::Config(msg) => write!(f, "Config error: {msg}"),
            Error::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_source_unavailable() {
        let err = Error::SourceUnavailable("no such file".to_string());
        assert_eq!(format!("{}", err), "Source unavailable: no such file");
    }

    #[test]
    fn display_formats_subtitle_parse() {
        let err = Error::SubtitleParse("bad timing line".to_string());
        assert!(format!("{}", err).contains("bad timing line"));
    }

    #[test]
    fn from_io_error_produces_io_variant() {
        let io_error = std::io::Error::other("boom");
        let err: Error = io_error.into();
        match err {
            Error::Io(message) => assert!(message.contains("boom")),
            _ => panic!("expected Io variant"),
        }
    }

    #[test]
    fn from_toml_error_produces_config_variant() {
        let parse_err = toml::from_str::<toml::Value>("not = = toml").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Config(_)));
    }
}

use std::fmt;

#[derive(Debug)]
pub enum RemixError {
    /// An operation needed a loaded clip but none was loaded.
    NoClipLoaded,
    /// Rendering was requested before any melody was generated.
    NoMelody,
    /// The audio context was closed; the session can no longer play.
    ContextClosed,
    InvalidFftSize { size: usize },
    InvalidSampleRate { rate: f64 },
    InvalidColor { text: String },
    InvalidConfig(String),
    Decode(String),
    Io(std::io::Error),
}

impl fmt::Display for RemixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemixError::NoClipLoaded => write!(f, "No audio clip loaded"),
            RemixError::NoMelody => write!(f, "No melody generated yet"),
            RemixError::ContextClosed => write!(f, "Audio context is closed"),
            RemixError::InvalidFftSize { size } => {
                write!(f, "FFT size {size} must be a power of two in 32..=32768")
            }
            RemixError::InvalidSampleRate { rate } => write!(f, "Invalid sample rate {rate}"),
            RemixError::InvalidColor { text } => write!(f, "Invalid colour '{text}', expected #rrggbb"),
            RemixError::InvalidConfig(msg) => write!(f, "Invalid config: {msg}"),
            RemixError::Decode(msg) => write!(f, "Decode error: {msg}"),
            RemixError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for RemixError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RemixError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RemixError {
    fn from(e: std::io::Error) -> Self {
        RemixError::Io(e)
    }
}

impl From<serde_json::Error> for RemixError {
    fn from(e: serde_json::Error) -> Self {
        RemixError::InvalidConfig(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(format!("{}", RemixError::NoClipLoaded), "No audio clip loaded");
        let e = RemixError::InvalidFftSize { size: 1000 };
        assert!(format!("{e}").contains("1000"));
    }

    #[test]
    fn json_error_converts() {
        let err = serde_json::from_str::<u32>("nope").unwrap_err();
        let e: RemixError = err.into();
        assert!(matches!(e, RemixError::InvalidConfig(_)));
    }
}

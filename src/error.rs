//! Error types for the drum sample classifier

use std::fmt;

/// Error type for drum sample classification
#[derive(Debug, Clone, PartialEq)]
pub enum DrumError {
    /// E001: Source file missing, unreadable or not decodable audio
    FileRead(String),
    /// E002: Model artifact missing or could not be loaded
    ModelLoad(String),
    /// E003: Classifier rejected or failed on the supplied tensor
    ModelInference(String),
    /// E004: Waveform or tensor does not have the fixed pipeline shape
    InvalidShape(String),
    /// E005: Configuration validation failed
    ConfigValidation(String),
}

impl DrumError {
    /// Stable error code, used in CLI output
    pub fn code(&self) -> &'static str {
        match self {
            DrumError::FileRead(_) => "E001",
            DrumError::ModelLoad(_) => "E002",
            DrumError::ModelInference(_) => "E003",
            DrumError::InvalidShape(_) => "E004",
            DrumError::ConfigValidation(_) => "E005",
        }
    }
}

impl fmt::Display for DrumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrumError::FileRead(msg) => {
                write!(f, "E001: Could not read audio file - {}", msg)
            }
            DrumError::ModelLoad(msg) => {
                write!(f, "E002: Could not load model - {}", msg)
            }
            DrumError::ModelInference(msg) => {
                write!(f, "E003: Model inference failed - {}", msg)
            }
            DrumError::InvalidShape(msg) => {
                write!(f, "E004: Invalid shape - {}", msg)
            }
            DrumError::ConfigValidation(msg) => {
                write!(f, "E005: Configuration validation failed - {}", msg)
            }
        }
    }
}

impl std::error::Error for DrumError {}

impl From<std::io::Error> for DrumError {
    fn from(err: std::io::Error) -> Self {
        DrumError::FileRead(format!("File I/O error: {}", err))
    }
}

impl From<hound::Error> for DrumError {
    fn from(err: hound::Error) -> Self {
        DrumError::FileRead(format!("WAV decode error: {}", err))
    }
}

impl From<serde_json::Error> for DrumError {
    fn from(err: serde_json::Error) -> Self {
        DrumError::ConfigValidation(format!("JSON error: {}", err))
    }
}

/// Result type alias for classifier operations
pub type Result<T> = std::result::Result<T, DrumError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_code() {
        let err = DrumError::FileRead("missing.wav".to_string());
        assert_eq!(err.code(), "E001");
        assert!(err.to_string().starts_with("E001:"));
        assert!(err.to_string().contains("missing.wav"));

        let err = DrumError::ModelInference("shape mismatch".to_string());
        assert!(err.to_string().starts_with(err.code()));
    }

    #[test]
    fn test_io_error_maps_to_file_read() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(DrumError::from(io), DrumError::FileRead(_)));
    }
}

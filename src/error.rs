//! Application error type.
//!
//! Every fatal condition carries the process exit code it maps to, so the
//! binary can stay a three-line wrapper around [`crate::app::run`].

use std::path::Path;

/// A required input file is absent.
pub const EXIT_MISSING_INPUT: u8 = 1;
/// Input exists but cannot be read, or an output cannot be written.
pub const EXIT_IO: u8 = 2;
/// Loading finished but nothing usable is left.
pub const EXIT_NO_DATA: u8 = 3;
/// An estimation step could not be carried out.
pub const EXIT_MODEL: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn missing_input(path: &Path) -> Self {
        Self::new(
            EXIT_MISSING_INPUT,
            format!("ERROR: {} not found", path.display()),
        )
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(EXIT_IO, message)
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(EXIT_NO_DATA, message)
    }

    pub fn model(message: impl Into<String>) -> Self {
        Self::new(EXIT_MODEL, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_maps_to_exit_one() {
        let err = AppError::missing_input(Path::new("2510006301-noSymbol.csv"));
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("2510006301-noSymbol.csv"));
    }
}

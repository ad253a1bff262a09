//! Application error type.
//!
//! Every fallible operation returns `Result<_, AppError>`. The error carries the
//! process exit code so `main` can map failures without inspecting messages:
//!
//! - `2`: usage / configuration (bad flag values, invalid hyperparameters)
//! - `3`: data (missing dataset files, blank images, shape mismatches)
//! - `4`: runtime (numerical failure, IO, rendering)

/// Exit code for invalid configuration.
pub const EXIT_USAGE: u8 = 2;
/// Exit code for missing or malformed data.
pub const EXIT_DATA: u8 = 3;
/// Exit code for numerical, IO or rendering failures.
pub const EXIT_RUNTIME: u8 = 4;

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

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, message)
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(EXIT_DATA, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, message)
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
    fn constructors_set_exit_codes() {
        assert_eq!(AppError::usage("x").exit_code(), EXIT_USAGE);
        assert_eq!(AppError::data("x").exit_code(), EXIT_DATA);
        assert_eq!(AppError::runtime("x").exit_code(), EXIT_RUNTIME);
        assert_eq!(AppError::data("missing file").to_string(), "missing file");
    }
}

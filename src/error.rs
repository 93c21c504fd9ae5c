/// Application-level error carrying the process exit code.
///
/// Exit codes: 2 = usage/configuration, 3 = no usable data, 4 = runtime/IO failure.
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

/// Failure of a single theme while it was being assembled.
#[derive(Debug, Clone, PartialEq)]
pub enum ThemeError {
    /// The request was superseded; discard everything.
    Cancelled,
    /// Input was unusable (bad group listing, mismatched series, ...).
    Processing(String),
}

impl std::fmt::Display for ThemeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemeError::Cancelled => write!(f, "theme request cancelled"),
            ThemeError::Processing(msg) => write!(f, "theme processing failed: {msg}"),
        }
    }
}

impl std::error::Error for ThemeError {}

impl From<String> for ThemeError {
    fn from(e: String) -> Self {
        ThemeError::Processing(e)
    }
}

impl From<&str> for ThemeError {
    fn from(e: &str) -> Self {
        ThemeError::Processing(e.to_string())
    }
}

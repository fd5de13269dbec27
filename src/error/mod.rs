use crate::address::StepAddress;
use std::fmt::Display;
use thiserror::Error;

pub mod codes;
pub mod helpers;

pub use codes::{describe_error_code, ErrorCode};
pub use helpers::{common, deserialize_config, ErrorExt};

/// Configuration error raised while parsing a step
///
/// Every problem detected during parsing (unknown keys, duplicate or missing
/// actions, modifier incompatibilities, invalid item configuration) is
/// reported through this single error kind. The address, when known, is
/// appended to the rendered message so users can find the offending entry.
#[derive(Error, Debug)]
#[error("[E{code:04}] {message}{}", render_address(.addr))]
pub struct StepError {
    code: u16,
    message: String,
    addr: Option<StepAddress>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

fn render_address(addr: &Option<StepAddress>) -> String {
    match addr {
        Some(addr) => format!(" ({})", addr),
        None => String::new(),
    }
}

impl StepError {
    /// Create a configuration error with default code
    pub fn new(message: impl Into<String>, addr: Option<StepAddress>) -> Self {
        Self::with_code(ErrorCode::CONFIG_GENERIC, message, addr)
    }

    /// Create a configuration error with specific code
    pub fn with_code(code: u16, message: impl Into<String>, addr: Option<StepAddress>) -> Self {
        Self {
            code,
            message: message.into(),
            addr,
            source: None,
        }
    }

    /// Create a configuration error located at an address
    pub fn at(addr: &StepAddress, code: u16, message: impl Into<String>) -> Self {
        Self::with_code(code, message, Some(addr.clone()))
    }

    /// Add a source error to this error
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Add context to the error message
    pub fn with_context(mut self, context: impl Display) -> Self {
        self.message = format!("{}: {}", self.message, context);
        self
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Get the bare message, without code or address
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn address(&self) -> Option<&StepAddress> {
        self.addr.as_ref()
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match &self.addr {
            Some(addr) => format!("Step configuration problem at {}: {}", addr, self.message),
            None => format!("Step configuration problem: {}", self.message),
        }
    }

    /// Get a developer-friendly error message with full chain
    pub fn developer_message(&self) -> String {
        let mut msg = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            msg.push_str(&format!("\n  caused by: {}", cause));
            source = cause.source();
        }
        msg
    }
}

/// Type alias for Results using StepError
pub type Result<T> = std::result::Result<T, StepError>;

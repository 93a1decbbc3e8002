//! Errors reported at the edges of the CPU API.
//!
//! Execution itself cannot fail: every byte sequence decodes to something.

use std::fmt;

/// An unknown register name was given to `str::parse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRegisterError {
    name: String,
}

impl ParseRegisterError {
    pub(crate) fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }

    /// The rejected name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ParseRegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown Z80 register: {:?}", self.name)
    }
}

impl std::error::Error for ParseRegisterError {}

/// Interrupt mode outside 0..=2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidInterruptMode(pub u8);

impl fmt::Display for InvalidInterruptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid interrupt mode {} (expected 0, 1 or 2)", self.0)
    }
}

impl std::error::Error for InvalidInterruptMode {}

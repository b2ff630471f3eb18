use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A validated short code identifier for a link.
///
/// Short codes must be 3-32 characters long and contain only
/// alphanumeric characters, hyphens, or underscores.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortCode(String);

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 32;

impl ShortCode {
    /// Creates a new `ShortCode` after validating the input.
    ///
    /// Valid codes are 3-32 characters and contain only `[a-zA-Z0-9_-]`.
    pub fn new(code: impl Into<String>) -> std::result::Result<Self, CoreError> {
        let code = code.into();
        Self::validate(&code)?;
        Ok(Self(code))
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this only for codes produced by trusted internal sources
    /// (e.g. values read back from the repository).
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(code: &str) -> std::result::Result<(), CoreError> {
        if code.len() < MIN_LENGTH || code.len() > MAX_LENGTH {
            return Err(CoreError::InvalidShortCode(format!(
                "length must be between {} and {}, got {}",
                MIN_LENGTH,
                MAX_LENGTH,
                code.len()
            )));
        }

        if !code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(CoreError::InvalidShortCode(format!(
                "must contain only alphanumeric characters, hyphens, or underscores: '{}'",
                code
            )));
        }

        Ok(())
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

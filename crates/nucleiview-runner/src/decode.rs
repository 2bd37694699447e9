//! Text decoding of tool output.

use std::borrow::Cow;
use std::fmt;
use std::str::{FromStr, Utf8Error};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How bytes that are not valid UTF-8 are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Substitute U+FFFD for each invalid sequence.
    #[default]
    Replace,
    /// Drop invalid sequences.
    Ignore,
    /// Reject the input.
    Strict,
}

impl DecodePolicy {
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>, Utf8Error> {
        match self {
            DecodePolicy::Replace => Ok(String::from_utf8_lossy(bytes)),
            DecodePolicy::Ignore => match std::str::from_utf8(bytes) {
                Ok(text) => Ok(Cow::Borrowed(text)),
                Err(_) => Ok(Cow::Owned(
                    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect(),
                )),
            },
            DecodePolicy::Strict => std::str::from_utf8(bytes).map(Cow::Borrowed),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DecodePolicy::Replace => "replace",
            DecodePolicy::Ignore => "ignore",
            DecodePolicy::Strict => "strict",
        }
    }
}

impl fmt::Display for DecodePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown decode policy '{0}' (valid: replace, ignore, strict)")]
pub struct UnknownDecodePolicy(pub String);

impl FromStr for DecodePolicy {
    type Err = UnknownDecodePolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(DecodePolicy::Replace),
            "ignore" => Ok(DecodePolicy::Ignore),
            "strict" => Ok(DecodePolicy::Strict),
            _ => Err(UnknownDecodePolicy(s.to_string())),
        }
    }
}

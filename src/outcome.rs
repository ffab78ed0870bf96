//! Result of an encrypt or decrypt request, shaped for display.

use serde::Serialize;

use crate::codec::Token;
use crate::error::{DecryptError, EncryptError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success {
        output: String,
    },
    Failure {
        kind: &'static str,
        message: String,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The text to show: output on success, the error message otherwise.
    pub fn text(&self) -> &str {
        match self {
            Self::Success { output } => output,
            Self::Failure { message, .. } => message,
        }
    }
}

impl From<Result<Token, EncryptError>> for Outcome {
    fn from(result: Result<Token, EncryptError>) -> Self {
        match result {
            Ok(token) => Self::Success {
                output: token.into_string(),
            },
            Err(e) => Self::Failure {
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }
}

impl From<Result<String, DecryptError>> for Outcome {
    fn from(result: Result<String, DecryptError>) -> Self {
        match result {
            Ok(output) => Self::Success { output },
            Err(e) => Self::Failure {
                kind: e.kind(),
                message: e.to_string(),
            },
        }
    }
}

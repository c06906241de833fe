//! Wire contract for the execution endpoint
//!
//! The engine itself links no HTTP framework; this module expresses the
//! endpoint's response contract as plain data so any transport layer can
//! honor it verbatim.

use serde::Serialize;

use crate::engine::EngineError;
use crate::types::{Classification, ExecutionResult};

/// Body of the generic internal-failure response; internals never leak
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Body of the unsupported-language response
pub const UNSUPPORTED_LANGUAGE_MESSAGE: &str = "Unsupported language";

/// JSON body of an execution response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    /// Program output (or the failure text surfaced to the submitter)
    Output { output: String },

    /// Request-level error, never program output
    Error { error: String },
}

/// HTTP-shaped response for one execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteResponse {
    /// HTTP status code
    pub status: u16,

    /// JSON body
    pub body: ResponseBody,
}

impl ExecuteResponse {
    /// Map a classified result onto the wire contract.
    ///
    /// Success carries stdout; every failure classification carries the
    /// surfaced failure text as `output` so the submitter can debug their
    /// program.
    pub fn from_result(result: &ExecutionResult) -> Self {
        match result.classification {
            Classification::Ok => Self {
                status: 200,
                body: ResponseBody::Output {
                    output: result.stdout.clone(),
                },
            },
            Classification::Timeout => Self {
                status: 408,
                body: ResponseBody::Output {
                    output: result.stderr.clone(),
                },
            },
            Classification::RuntimeError
            | Classification::IsolationStartFailure
            | Classification::IsolationUnavailable => Self {
                status: 500,
                body: ResponseBody::Output {
                    output: result.stderr.clone(),
                },
            },
        }
    }

    /// Map an engine error onto the wire contract
    pub fn from_error(error: &EngineError) -> Self {
        match error {
            EngineError::UnsupportedLanguage(_) => Self {
                status: 400,
                body: ResponseBody::Error {
                    error: UNSUPPORTED_LANGUAGE_MESSAGE.to_owned(),
                },
            },
            _ => Self {
                status: 500,
                body: ResponseBody::Error {
                    error: INTERNAL_ERROR_MESSAGE.to_owned(),
                },
            },
        }
    }

    /// Map a full engine outcome onto the wire contract
    pub fn from_outcome(outcome: &Result<ExecutionResult, EngineError>) -> Self {
        match outcome {
            Ok(result) => Self::from_result(result),
            Err(error) => Self::from_error(error),
        }
    }

    /// Serialize the body as a JSON value
    pub fn body_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.body).expect("response body serializes")
    }
}

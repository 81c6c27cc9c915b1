//! The shared error taxonomy, threaded through every crate's `Result` alias
//! and mapped to JSON-RPC error objects only at the `wov-gateway` boundary.

use thiserror::Error;

use crate::value::Value;

/// Every failure mode interior crates can produce.
#[derive(Debug, Error)]
pub enum WovError {
    /// Internal control-flow signal raised by the `return` opcode and
    /// caught at the nearest enclosing verb call boundary. Never reaches
    /// the gateway — `wov-dispatch` unwraps it into a normal return value.
    #[error("return (internal control flow, should never surface)")]
    Return(Value),

    /// Internal control-flow signal raised by the `throw` opcode and caught
    /// by the nearest enclosing `try`. If it escapes the outermost verb
    /// call, `wov-dispatch` converts it into a `ScriptError`.
    #[error("thrown: {0}")]
    Thrown(Value),

    /// The inbound request body was not well-formed JSON-RPC.
    #[error("parse error: {0}")]
    ParseError(String),

    /// The request was well-formed JSON but violated the method's shape.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No opcode or RPC method by that name is registered.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// No verb by that name was found on the entity or its prototype chain.
    #[error("verb not found: {entity}.{verb}")]
    VerbNotFound { entity: String, verb: String },

    /// The caller lacked a capability the verb or opcode required.
    #[error("capability denied: requires {required_type}")]
    CapabilityDenied {
        /// The capability type name that was missing.
        required_type: String,
    },

    /// A verb raised an error during interpretation.
    #[error("script error: {message}")]
    ScriptError {
        message: String,
        /// Innermost-first call frames at the point of failure.
        stack: Vec<String>,
    },

    /// The interpreter's gas budget was exhausted before the verb finished.
    #[error("gas exhausted")]
    GasExhausted,

    /// An I/O opcode did not resolve within its deadline.
    #[error("timeout")]
    Timeout,

    /// Storage or other infrastructure failure not attributable to the
    /// caller.
    #[error("internal error: {0}")]
    Internal(String),
}

/// The crate-wide result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, WovError>;

impl WovError {
    /// JSON-RPC 2.0 error code this error maps to at the gateway boundary.
    #[must_use]
    pub fn rpc_code(&self) -> i32 {
        match self {
            // Both are caught well before the gateway boundary in normal
            // operation; these codes only matter if that invariant breaks.
            WovError::Return(_) => -32603,
            WovError::Thrown(_) => -32001,
            WovError::ParseError(_) => -32700,
            WovError::InvalidRequest(_) => -32600,
            WovError::MethodNotFound(_) => -32601,
            WovError::VerbNotFound { .. } => -32602,
            WovError::CapabilityDenied { .. } => -32001,
            WovError::ScriptError { .. } => -32000,
            WovError::GasExhausted | WovError::Timeout => -32000,
            WovError::Internal(_) => -32603,
        }
    }
}

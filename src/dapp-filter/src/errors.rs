use thiserror::Error;

use dapp_filter_types::ListId;

/// Errors during payload decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload too short to hold a selector ({0} bytes)")]
    Truncated(usize),
    #[error("argument area of {0} bytes is not word aligned")]
    MisalignedArgs(usize),
    #[error("argument {0} is not a canonical address")]
    DirtyAddress(usize),
    #[error("payload is not a multiCall invocation")]
    NotMultiCall,
    #[error("abi decoding failed: {0}")]
    Abi(String),
}

/// Errors while loading registry / executor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid method signature or selector: {0}")]
    InvalidSelector(String),
    #[error("list {0} declared more than once")]
    DuplicateList(ListId),
    #[error("executor references {0}, which is not declared")]
    UnknownList(ListId),
}

/// Why a batch was refused. Every variant is recovered into a `BatchResult`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MultiCallError {
    /// No filter, a rejecting filter, or a malformed payload.
    #[error("call {index} not authorised: {detail}")]
    Unauthorised { index: usize, detail: String },
    /// The call was authorised but the target reverted.
    #[error("call {index} failed: {reason}")]
    Execution { index: usize, reason: String },
}

impl MultiCallError {
    pub fn index(&self) -> usize {
        match self {
            Self::Unauthorised { index, .. } | Self::Execution { index, .. } => *index,
        }
    }
}

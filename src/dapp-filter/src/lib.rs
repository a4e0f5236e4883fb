//! Fail-closed call filtering for a multicall wallet.
//!
//! Every outbound call of a batch is decoded into a [`decoder::CallDescriptor`],
//! routed through the [`registry::DappRegistry`] to the filter registered for its
//! spender, and only executed when every call of the batch is authorised. The
//! [`multicall::MultiCall`] executor runs authorised batches atomically against an
//! [`multicall::ExecutionBackend`].

pub mod abi;
pub mod config;
pub mod decoder;
pub mod errors;
pub mod filters;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod multicall;
pub mod registry;


pub use abi::Call;
pub use config::{FilterConfig, RegistryConfig};
pub use decoder::{decode_call, decode_multicall, encode_multicall, encode_transaction, CallDescriptor};
pub use errors::{ConfigError, DecodeError, MultiCallError};
pub use filters::Filter;
pub use multicall::{BatchResult, CallReport, ExecutionBackend, ExecutionOptions, MultiCall, Revert};
pub use registry::{DappRegistry, RegistrySnapshot};

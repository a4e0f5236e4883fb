//! ABI bindings for the wallet entry point and the filtered targets.

pub mod constants;
pub mod interfaces;

pub use interfaces::{Call, ICurvePool, IDaiJoin, IERC20, ILido, IMultiCall, IPot, IVat};

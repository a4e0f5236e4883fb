//! Shared types for the dapp filter engine (registry, executor and tooling).

pub mod list;
pub mod selector;
pub mod verdict;

pub use list::{ListId, DEFAULT_LIST};
pub use selector::{format_selector, parse_selector, selector, Selector};
pub use verdict::AuthorizationVerdict;

use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a filter list.
///
/// A list groups (target, filter) entries under a single enable/disable toggle so
/// whole sets of authorisations can be staged or retracted at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(pub u8);

/// The list consulted by the executor unless configured otherwise.
pub const DEFAULT_LIST: ListId = ListId(0);

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "list#{}", self.0)
    }
}

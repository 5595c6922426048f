//! Process table, namespace forest and identity resolution.

pub mod identity;
pub mod namespace;
pub mod process;

pub use identity::{GlobalResolver, IdentityResolver, NsLocalResolver};
pub use namespace::{NamespaceTree, NsError, NsId};
pub use process::{Current, Identity, ProcError, ProcHandle, ProcTable};

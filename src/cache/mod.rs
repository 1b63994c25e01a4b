//! Query/mutation cache coordination: keyed entries with fresh and retention
//! windows, parameter-bound reads, and writes that invalidate or patch the
//! entries they affect.

pub mod key;
pub mod mutation;
pub mod policy;
pub mod query;
pub mod store;

pub use key::{KeyFamily, KeyFilter, QueryKey};
pub use mutation::{Mutation, MutationState, MutationStatus};
pub use policy::{CachePolicy, PolicyTable};
pub use query::{Query, QueryOptions, QueryState, QueryStatus};
pub use store::QueryClient;

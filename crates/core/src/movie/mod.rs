//! Movie value types shared by the remote client, the cache and the search
//! pipeline.

mod types;

pub use types::*;

pub mod factory;
pub mod pipeline;
pub mod query;
pub mod sled_store;
pub mod store;

pub use factory::{create_in_memory_store, create_store};
pub use pipeline::{Accumulator, Expr, GroupKey, Pipeline, Stage};
pub use query::{FindQuery, ReadingFilter, SortOrder, SortSpec};
pub use sled_store::SledStore;
pub use store::*;

pub mod reading;
pub mod summary;
pub mod units;

pub use reading::*;
pub use summary::*;
pub use units::*;

/// A stored document: a flat JSON object as the store sees it
pub type Document = serde_json::Map<String, serde_json::Value>;

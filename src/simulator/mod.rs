pub mod generator;
pub mod sender;

pub use generator::{reading_to_json, ReadingGenerator};
pub use sender::{ReadingSender, SendSummary};

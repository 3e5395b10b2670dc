pub mod fields;
pub mod identity;
pub mod processor;

pub use processor::IdentityMergeProcessor;

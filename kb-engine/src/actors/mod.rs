pub mod usage;

pub use usage::{UsageActor, UsageArguments, UsageMsg, UsageStore};

pub mod messages;
pub mod settings;
pub mod snapshot;
pub mod worker;

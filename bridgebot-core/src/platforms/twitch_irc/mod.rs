pub mod client;
pub mod runtime;

pub use runtime::TwitchIrcPlatform;

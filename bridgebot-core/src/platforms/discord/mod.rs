pub mod runtime;

pub use runtime::{DiscordInbound, DiscordPlatform};

pub mod announce_channel;
pub mod channel;
pub mod literally;
pub mod quote;
pub mod simple_command;
pub mod stream;
pub mod user;

pub use announce_channel::{AnnounceChannel, AnnounceType};
pub use channel::TwitchChannelSettings;
pub use literally::Literally;
pub use quote::Quote;
pub use simple_command::SimpleCommand;
pub use stream::StreamInfo;
pub use user::{User, UserClass, DEFAULT_STYLE};

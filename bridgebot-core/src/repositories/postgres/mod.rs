// src/repositories/postgres/mod.rs

pub mod announce_channel;
pub mod channel;
pub mod literally;
pub mod quote;
pub mod simple_command;
pub mod user;

pub use announce_channel::PostgresAnnounceChannelRepository;
pub use channel::PostgresChannelSettingsRepository;
pub use literally::PostgresLiterallyRepository;
pub use quote::PostgresQuoteRepository;
pub use simple_command::PostgresSimpleCommandRepository;
pub use user::PostgresUserRepository;

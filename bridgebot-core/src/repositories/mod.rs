pub mod postgres;

pub use bridgebot_common::traits::repository_traits::{
    AnnounceChannelRepository, ChannelSettingsRepository, QuoteRepository,
    SimpleCommandRepository, UserRepository,
};
pub use postgres::announce_channel::PostgresAnnounceChannelRepository;
pub use postgres::channel::PostgresChannelSettingsRepository;
pub use postgres::quote::PostgresQuoteRepository;
pub use postgres::simple_command::PostgresSimpleCommandRepository;
pub use postgres::user::PostgresUserRepository;

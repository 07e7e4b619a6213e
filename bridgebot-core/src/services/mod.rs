// src/services/mod.rs

pub mod adapter;
pub mod builtin;
pub mod context;
pub mod dispatcher;
pub mod link_service;
pub mod registry;

pub use context::{ChatContext, DiscordChatEvent, TwitchChatEvent};
pub use dispatcher::Dispatcher;
pub use link_service::LinkService;
pub use registry::{CommandCategory, CommandDefinition, CommandRegistry};

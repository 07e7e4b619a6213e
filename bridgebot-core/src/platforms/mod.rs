pub mod discord;
pub mod twitch_api;
pub mod twitch_irc;

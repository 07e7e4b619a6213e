// src/lib.rs

pub mod auth;
pub mod db;
pub mod platforms;
pub mod repositories;
pub mod services;
pub mod tasks;

pub use bridgebot_common::error::Error;
pub use bridgebot_common::models;
pub use db::Database;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use crate::Error;
use crate::services::context::ChatContext;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<String, Error>> + Send>>;

/// A command handler takes the normalized context plus the already-parsed
/// parameter remainder and returns the reply text. An empty reply means
/// "say nothing".
pub type CommandHandler = Arc<dyn Fn(ChatContext, Option<String>) -> HandlerFuture + Send + Sync>;

/// Wraps an async fn/closure into the boxed handler shape the registry stores.
pub fn handler<F, Fut>(f: F) -> CommandHandler
where
    F: Fn(ChatContext, Option<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, Error>> + Send + 'static,
{
    Arc::new(move |ctx, param| Box::pin(f(ctx, param)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCategory {
    General,
    Help,
    Accounts,
    Channel,
    Admin,
    Simple,
}

impl CommandCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandCategory::General => "General",
            CommandCategory::Help => "Help",
            CommandCategory::Accounts => "Accounts",
            CommandCategory::Channel => "Channel",
            CommandCategory::Admin => "Admin",
            CommandCategory::Simple => "Simple",
        }
    }
}

/// Immutable once registered.
#[derive(Clone)]
pub struct CommandDefinition {
    pub name: String,
    pub category: CommandCategory,
    pub short_description: String,
    pub usage: String,
    pub handler: CommandHandler,
}

/// Per-platform mapping of command name to handler metadata. Names are stored
/// lowercased; lookups are case-insensitive.
#[derive(Default)]
pub struct CommandRegistry {
    commands: RwLock<HashMap<String, Arc<CommandDefinition>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registering a duplicate name is a configuration error; the original
    /// registration is left untouched.
    pub fn register(&self, def: CommandDefinition) -> Result<(), Error> {
        let key = def.name.to_lowercase();
        let mut commands = self.commands.write().unwrap();
        if commands.contains_key(&key) {
            return Err(Error::Registry(format!(
                "command handler for '{}' already registered",
                def.name
            )));
        }
        commands.insert(key, Arc::new(def));
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<CommandDefinition>> {
        self.commands
            .read()
            .unwrap()
            .get(&name.to_lowercase())
            .cloned()
    }

    /// Idempotent.
    pub fn remove(&self, name: &str) {
        self.commands.write().unwrap().remove(&name.to_lowercase());
    }

    pub fn exists(&self, name: &str) -> bool {
        self.commands
            .read()
            .unwrap()
            .contains_key(&name.to_lowercase())
    }

    /// Snapshot of (name, category, short description) for help listings.
    pub fn list(&self) -> Vec<(String, CommandCategory, String)> {
        let commands = self.commands.read().unwrap();
        let mut out: Vec<_> = commands
            .values()
            .map(|d| (d.name.clone(), d.category, d.short_description.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

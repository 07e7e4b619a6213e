pub mod callback_server;

pub use callback_server::{start_callback_server, CallbackState};

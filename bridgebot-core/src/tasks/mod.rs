pub mod stream_announcer;

pub use stream_announcer::{StreamAnnouncer, StreamCacheHandle};

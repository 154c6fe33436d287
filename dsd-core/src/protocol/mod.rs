//! Protocol frame dispatcher: routes a matched [`crate::sync::SyncEvent`] to
//! the per-protocol decoder registered for its pattern.

pub mod dispatcher;
pub mod events;

pub use dispatcher::{NullProtocolDecoder, ProtocolDecoder, ProtocolDispatcher};
pub use events::ProtocolEvent;

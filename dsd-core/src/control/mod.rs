//! UDP retune listener and SM watchdog: the two background threads that
//! drive the decoder context outside of the sample-pump/decode path.

pub mod udp_listener;
pub mod watchdog;

pub use udp_listener::UdpControlListener;
pub use watchdog::{CasLock, Watchdog};

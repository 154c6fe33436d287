//! Tuning control plane: translates Trunk-SM actions into rig/SDR commands.

pub mod dispatcher;
pub mod rigctl;
pub mod rtl_udp;

pub use dispatcher::{DirectStreamTuner, NoDirectStream, TuningDispatcher};
pub use rigctl::RigctlClient;
pub use rtl_udp::RtlUdpTuner;

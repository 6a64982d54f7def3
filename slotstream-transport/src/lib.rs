//! Slotstream Transport Boundary
//!
//! This crate describes the discovery-based streaming layer the engine talks
//! to: resolving advertised sources by type, opening inlets and outlets,
//! pulling sample chunks and pushing single samples. It also ships an
//! in-process loopback implementation of that boundary.

pub mod descriptor;
pub mod error;
pub mod loopback;
pub mod queue;
pub mod time;
pub mod traits;

pub use descriptor::{ChannelFormat, ConnectionId, OutletSpec, SourceHandle, StreamDescriptor};
pub use error::{TransportError, TransportResult};
pub use loopback::{LoopbackInlet, LoopbackOutlet, LoopbackTransport};
pub use queue::SampleQueue;
pub use time::{Timer, Timestamp};
pub use traits::{Chunk, Inlet, Outlet, Transport};

//! Slotstream
//!
//! Runtime-resizable stream slots over a discovery-based sample streaming
//! layer: resolve sources by type and name, drain inbound data in bounded
//! chunks, push one sample per cycle outbound.

pub use slotstream_engine as engine;
pub use slotstream_transport as transport;

// Re-export commonly used types
pub use engine::{
    CycleReport, NodeStats, NodeStatus, ReceiveNode, ReceiveSettings, SendNode, SendSettings,
    SlotOutput,
};
pub use transport::{LoopbackTransport, StreamDescriptor, Transport, TransportError};

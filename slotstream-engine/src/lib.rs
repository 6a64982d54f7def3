//! Slotstream Engine
//!
//! Stream-cardinality and chunked-transfer engine: a runtime-resizable set of
//! stream slots, resolution and (re)binding of each slot to a remote source,
//! bounded per-cycle draining of inbound data, one-sample-per-cycle pushing
//! of outbound data, and change-driven reconnection.

pub mod buffer;
pub mod error;
pub mod inlet;
pub mod outlet;
pub mod receive;
pub mod reconnect;
pub mod resolver;
pub mod send;
pub mod settings;
pub mod slot_set;
pub mod stats;
pub mod status;

pub use buffer::{SampleBuffer, SlotOutput};
pub use error::{ConfigError, EngineError};
pub use inlet::{
    drain_inlet, BindReport, DrainParams, DrainReport, InletBinding, InletManager, InletSlot,
};
pub use outlet::{
    validate_declarations, OutletBinding, OutletDeclaration, OutletManager, OutletSlot,
    OutletStatus, PushReport, RebuildReport,
};
pub use receive::ReceiveNode;
pub use reconnect::{ChangeSet, ReconnectController, ReconnectState, WatchedInputs};
pub use resolver::{select_by_name, StreamResolver};
pub use send::SendNode;
pub use settings::{ReceiveSettings, SendSettings};
pub use slot_set::{ResizeEvent, Slot, SlotConfig, SlotSet};
pub use stats::{CycleReport, NodeStats, SlotSnapshot, SlotStats};
pub use status::NodeStatus;

#![warn(missing_docs)]

//! Tessel runtime crate: an in-order device command queue with its own server thread, device
//! memory handles, completion events and the global configuration shared by all Tessel crates.

#[macro_use]
extern crate derive_new;

mod id;

/// Device capabilities.
pub mod device;
/// Completion events and synchronization.
pub mod event;
/// Kernel abstraction executed by the device.
pub mod kernel;
/// Device memory handles.
pub mod memory;
/// Device command queue.
pub mod queue;
/// Server side errors and stage tagging.
pub mod server;
/// Host to device copy primitives.
pub mod transfer;

/// Runtime configuration.
pub mod config;
/// Debugging and profiling utilities.
pub mod logging;
/// Future helpers.
pub mod future;

mod channel;

pub use device::*;
pub use event::{Event, EventStatus, IntoEvents, wait};
pub use id::{BufferId, QueueId};
pub use kernel::*;
pub use memory::Buffer;
pub use queue::Queue;
pub use server::{ExecutionError, LaunchError, Stage};

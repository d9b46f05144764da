//! GPU resource management
//!
//! Contains the named-buffer registry and the compute dispatcher that
//! together back the particle solver's GPU side.

pub mod dispatcher;
pub mod registry;

pub use dispatcher::{BarrierScope, ComputeDispatcher, DispatchError, WORKGROUP_SIZE};
pub use registry::{BufferRegistry, NamedBuffer, RegistryError};

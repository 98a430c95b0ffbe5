//! Call execution subsystem.
//!
//! # Data Flow
//! ```text
//! RequestDescriptor
//!     → invoker.rs (blocking or deferred, by declared return shape)
//!     → Transport
//!     → adapter.rs (status check, payload decoding)
//!     → value | PendingCall (pending.rs)
//! ```

pub mod adapter;
pub mod invoker;
pub mod pending;

pub use adapter::{AdapterCache, ResponseAdapter};
pub use invoker::{Invoker, Outcome};
pub use pending::{CallState, Completer, PendingCall};

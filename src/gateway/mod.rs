//! Znode translation layer.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → path.rs (prefix '/', reject malformed paths)
//!     → node.rs (NodeGateway operation)
//!         → codec.rs (encode request payload)
//!         → ConnectionManager handle → Coordinator call
//!         → codec.rs (decode stored bytes)
//!     → value or ZnodeError back to the handler
//! ```

pub mod codec;
pub mod node;
pub mod path;

pub use codec::{Decoded, Payload};
pub use node::{NodeData, NodeGateway};

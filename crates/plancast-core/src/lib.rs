//! Core session coordination for Plancast.

mod error;
mod hub;
mod registry;
mod session;

pub use error::PlancastError;
pub use hub::{ConnectionId, Hub, HubConfig};
pub use registry::SessionRegistry;
pub use session::{AdminSeat, Session};

/// Result type for Plancast operations.
pub type Result<T> = std::result::Result<T, PlancastError>;

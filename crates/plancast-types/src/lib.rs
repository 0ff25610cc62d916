//! Shared types for the Plancast estimation server.

mod session;
mod ws;

pub use session::*;
pub use ws::*;

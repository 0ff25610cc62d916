//! Error types for Plancast.

use crate::ConnectionId;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PlancastError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Connection not registered: {0}")]
    ConnectionNotRegistered(ConnectionId),
}

//! Plancast server library - WebSocket coordinator for shared estimation sessions.
//!
//! This library provides the HTTP routes, WebSocket handler, and application
//! state for the Plancast server. It's separated from main.rs to enable
//! integration testing.

pub mod config;
pub mod logging;
pub mod routes;
pub mod state;
pub mod websocket;

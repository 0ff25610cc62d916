//! WebSocket event protocol between client and server.
//!
//! Every message on the wire is `{"event": "<name>", "data": {...}}` with
//! kebab-case event names and camelCase payload fields. Events without a
//! payload omit the `data` key entirely.

use crate::{SessionSnapshot, SizingTechnique};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Events sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Ask whether a session currently exists. Pure query, answered with
    /// `health-callback` to the caller only.
    #[serde(rename_all = "camelCase")]
    HealthCheck { session_id: Uuid },
    /// Create a new session. An empty or missing admin username leaves the
    /// session "open": the first joiner (any name) takes the admin seat.
    #[serde(rename_all = "camelCase")]
    CreateSession { admin_username: Option<String> },
    /// Join an existing session under a display name.
    #[serde(rename_all = "camelCase")]
    JoinSession { session_id: Uuid, username: String },
    /// Append an opaque record to the session's shared history log.
    #[serde(rename_all = "camelCase")]
    AddHistoryEvent {
        session_id: Uuid,
        history_event: Value,
    },
    /// Switch the estimation scale. Admin only; discards votes in progress.
    #[serde(rename_all = "camelCase")]
    ChangeSizingTechnique {
        session_id: Uuid,
        technique: SizingTechnique,
    },
    /// Cast or overwrite this member's vote for the current round. The
    /// session is implied by the connection's earlier join.
    Vote { value: String },
    /// Mark the round as actively voting. Admin only.
    #[serde(rename_all = "camelCase")]
    StartTheVoting { session_id: Uuid },
    /// Expose all votes and block further voting until reset. Admin only.
    #[serde(rename_all = "camelCase")]
    RevealVotes { session_id: Uuid },
    /// Clear votes and both round flags. Admin only.
    #[serde(rename_all = "camelCase")]
    RestartVoting { session_id: Uuid },
    /// Set the shared ticket text under discussion. Admin only.
    #[serde(rename_all = "camelCase")]
    AdminInput { session_id: Uuid, text: String },
    /// Remove a member from the session. Admin only.
    #[serde(rename_all = "camelCase")]
    KickUser { session_id: Uuid, username: String },
    /// Rename the calling member. The old name's vote is dropped, not
    /// migrated.
    #[serde(rename_all = "camelCase")]
    UsernameChanged {
        session_id: Uuid,
        username: String,
        old_username: String,
    },
}

/// Events sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Answer to `health-check`, delivered to the caller only.
    #[serde(rename_all = "camelCase")]
    HealthCallback { session_healthy: bool },
    /// Answer to `create-session`, delivered to the caller only.
    #[serde(rename_all = "camelCase")]
    SessionCreated { session_id: Uuid },
    /// Full-state broadcast on every join or rename.
    UserJoined(SessionSnapshot),
    /// Full history log, broadcast after every append.
    HistoryUpdated { history: Vec<Value> },
    /// The estimation scale changed; clients drop their local votes.
    SizingTechniqueChanged { technique: SizingTechnique },
    /// A single vote was cast, broadcast incrementally.
    Vote { username: String, vote: String },
    /// The admin started a round.
    VotingActive,
    /// The admin revealed the round's votes.
    VotesRevealed,
    /// The admin reset the round.
    VotingReset,
    /// New ticket text from the admin.
    AdminInput { text: String },
    /// A member was removed by the admin, with the updated member list.
    UserKicked { username: String, users: Vec<String> },
    /// Personal notice to the member that was just kicked.
    Kicked { message: String },
    /// A member disconnected, with the updated member list.
    UserLeft { username: String, users: Vec<String> },
    /// Error addressed to a single caller (join to a missing session, or
    /// the terminal host-has-left notice).
    Error { title: String, message: String },
}

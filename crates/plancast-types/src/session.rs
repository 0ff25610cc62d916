//! Session-level types shared between the hub and the wire protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Estimation scale used for a voting round.
///
/// Changing the technique mid-round discards any votes already cast, since
/// values from one scale are meaningless on another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizingTechnique {
    /// Classic fibonacci points (1, 2, 3, 5, 8, ...).
    #[default]
    Fibonacci,
    /// T-shirt sizes (XS, S, M, L, XL).
    TShirt,
    /// Powers of two (1, 2, 4, 8, 16, ...).
    PowersOfTwo,
}

/// Full session state, broadcast to the whole room whenever membership
/// changes (join or rename) so every client re-synchronizes from scratch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// The member that triggered this broadcast (joined or renamed).
    pub username: String,
    /// Present only on a rename, carrying the name being replaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_username: Option<String>,
    pub users: Vec<String>,
    pub admin_username: Option<String>,
    pub ticket_text: Option<String>,
    pub reveal_votes: bool,
    pub voting_active: bool,
    pub session_votes: HashMap<String, String>,
    pub plan_sizing_technique: SizingTechnique,
    pub history: Vec<Value>,
}

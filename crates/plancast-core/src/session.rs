//! Per-session record: membership, the admin seat, and the voting round.

use crate::hub::ConnectionId;
use chrono::{DateTime, Utc};
use plancast_types::{SessionSnapshot, SizingTechnique};
use serde_json::Value;
use std::collections::HashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Who holds administrative rights for a session.
///
/// Privileged actions pass only against `Held` with a matching connection
/// id, so a disconnected admin's pending window fails every check without
/// any comparison against a dangling handle.
#[derive(Debug)]
pub enum AdminSeat {
    /// Nobody has claimed the seat yet (freshly created session).
    Vacant,
    /// Held by a live connection.
    Held(ConnectionId),
    /// The admin connection dropped. A join matching the admin username can
    /// reclaim the seat until the deadline; otherwise the reaper deletes
    /// the session.
    PendingReclaim { until: Instant },
}

/// One estimation room.
///
/// Owned exclusively by the [`SessionRegistry`](crate::SessionRegistry);
/// connections only ever hold the session id.
#[derive(Debug)]
pub struct Session {
    pub admin_seat: AdminSeat,
    /// Display name designated as admin at creation. `None` means "open":
    /// any joiner takes the seat.
    pub admin_username: Option<String>,
    /// Distinct display names in join order. A rejoin never moves a name.
    pub users: Vec<String>,
    /// Votes for the current round, keyed by display name.
    pub votes: HashMap<String, String>,
    /// One-way gate: once true, votes are frozen until a reset.
    pub reveal: bool,
    /// Display flag only; vote acceptance is gated by `reveal` alone.
    pub voting_active: bool,
    pub sizing_technique: SizingTechnique,
    /// Shared ticket text under discussion, set by the admin.
    pub ticket_text: Option<String>,
    /// Append-only log of opaque records contributed by members.
    pub history: Vec<Value>,
    /// Pending reaper task while the admin seat awaits reclaim.
    pub delete_timer: Option<JoinHandle<()>>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(admin_username: Option<String>) -> Self {
        Self {
            admin_seat: AdminSeat::Vacant,
            admin_username,
            users: Vec::new(),
            votes: HashMap::new(),
            reveal: false,
            voting_active: false,
            sizing_technique: SizingTechnique::default(),
            ticket_text: None,
            history: Vec::new(),
            delete_timer: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_admin(&self, conn: ConnectionId) -> bool {
        matches!(self.admin_seat, AdminSeat::Held(holder) if holder == conn)
    }

    /// Admin election on join: a username matching the designated admin, or
    /// any username when the session is open, takes the seat (displacing a
    /// previous holder) and cancels a pending deletion. Returns whether the
    /// seat changed hands.
    pub fn try_claim_seat(&mut self, conn: ConnectionId, username: &str) -> bool {
        let claimable = match &self.admin_username {
            None => true,
            Some(admin) => admin == username,
        };
        if claimable {
            self.cancel_delete_timer();
            self.admin_seat = AdminSeat::Held(conn);
        }
        claimable
    }

    /// Move the seat into its grace window and arm the reaper task.
    /// Cancel-then-store keeps rescheduling idempotent.
    pub fn begin_reclaim_window(&mut self, until: Instant, timer: JoinHandle<()>) {
        self.cancel_delete_timer();
        self.admin_seat = AdminSeat::PendingReclaim { until };
        self.delete_timer = Some(timer);
    }

    pub fn cancel_delete_timer(&mut self) {
        if let Some(timer) = self.delete_timer.take() {
            timer.abort();
        }
    }

    pub fn add_user(&mut self, username: &str) {
        if !self.users.iter().any(|user| user == username) {
            self.users.push(username.to_string());
        }
    }

    /// Remove a member and their current vote.
    pub fn remove_user(&mut self, username: &str) {
        self.users.retain(|user| user != username);
        self.votes.remove(username);
    }

    pub fn start_voting(&mut self) {
        self.voting_active = true;
    }

    /// One-way per round. Returns false when already revealed.
    pub fn reveal_votes(&mut self) -> bool {
        if self.reveal {
            return false;
        }
        self.reveal = true;
        true
    }

    pub fn restart_voting(&mut self) {
        self.reveal = false;
        self.voting_active = false;
        self.votes.clear();
    }

    /// Switching scale invalidates any votes in progress.
    pub fn change_sizing_technique(&mut self, technique: SizingTechnique) {
        self.sizing_technique = technique;
        self.votes.clear();
    }

    /// Record a vote, overwriting this member's earlier one. Rejected once
    /// the round is revealed.
    pub fn cast_vote(&mut self, username: &str, value: String) -> bool {
        if self.reveal {
            return false;
        }
        self.votes.insert(username.to_string(), value);
        true
    }

    pub fn snapshot(&self, username: &str, old_username: Option<String>) -> SessionSnapshot {
        SessionSnapshot {
            username: username.to_string(),
            old_username,
            users: self.users.clone(),
            admin_username: self.admin_username.clone(),
            ticket_text: self.ticket_text.clone(),
            reveal_votes: self.reveal,
            voting_active: self.voting_active,
            session_votes: self.votes.clone(),
            plan_sizing_technique: self.sizing_technique,
            history: self.history.clone(),
        }
    }
}

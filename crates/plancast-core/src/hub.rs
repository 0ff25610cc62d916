//! Event router and broadcast gateway.
//!
//! The hub owns the session registry and all connection-scoped state behind
//! one mutex. Each inbound event runs its whole read-validate-mutate-
//! broadcast sequence under the lock, so events on a session are applied in
//! arrival order with nothing interleaved between mutation and broadcast.
//! Delivery itself is a non-blocking push into each peer's unbounded outbox;
//! the transport layer drains those into sockets.

use crate::{AdminSeat, PlancastError, Result, Session, SessionRegistry};
use dashmap::DashMap;
use plancast_types::{ClientEvent, ServerEvent, SizingTechnique};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Stable, opaque identity for one transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Hub tuning knobs.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// How long a session survives after its admin disconnects before the
    /// reaper deletes it.
    pub admin_grace: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            admin_grace: Duration::from_secs(30),
        }
    }
}

/// Connection-scoped attributes, written by `join-session` and
/// `username-changed`. Never invalidated when a session is deleted; stale
/// ids simply fail the registry lookup later.
#[derive(Debug, Default)]
struct ConnState {
    session_id: Option<Uuid>,
    username: Option<String>,
}

struct HubState {
    registry: SessionRegistry,
    conns: HashMap<ConnectionId, ConnState>,
}

/// Session coordinator: registry, election, round state machine, reaper,
/// and room-scoped fan-out in one place.
pub struct Hub {
    config: HubConfig,
    state: Mutex<HubState>,
    peers: DashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,
}

impl Hub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            state: Mutex::new(HubState {
                registry: SessionRegistry::new(),
                conns: HashMap::new(),
            }),
            peers: DashMap::new(),
        }
    }

    /// Register a transport connection. The returned receiver carries every
    /// event addressed to it (direct or via room broadcast) until
    /// [`Hub::disconnect`].
    pub async fn register(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let conn = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        self.peers.insert(conn, tx);
        self.state.lock().await.conns.insert(conn, ConnState::default());
        debug!(target: "plancast::hub", "Connection {} registered", conn);
        (conn, rx)
    }

    /// Route one inbound event to completion.
    ///
    /// Unauthorized privileged actions and references to missing sessions
    /// are dropped without any reply by design; existing clients depend on
    /// the silence. The only caller-visible failures are `health-callback`
    /// and the join-time `error` event.
    pub async fn handle_event(&self, conn: ConnectionId, event: ClientEvent) -> Result<()> {
        let mut state = self.state.lock().await;
        match event {
            ClientEvent::HealthCheck { session_id } => {
                let session_healthy = state.registry.contains(session_id);
                self.send_to(conn, ServerEvent::HealthCallback { session_healthy });
            }
            ClientEvent::CreateSession { admin_username } => {
                self.create_session(&mut state, conn, admin_username);
            }
            ClientEvent::JoinSession {
                session_id,
                username,
            } => {
                self.join_session(&mut state, conn, session_id, username)?;
            }
            ClientEvent::AddHistoryEvent {
                session_id,
                history_event,
            } => {
                self.add_history_event(&mut state, session_id, history_event);
            }
            ClientEvent::ChangeSizingTechnique {
                session_id,
                technique,
            } => {
                self.change_sizing_technique(&mut state, conn, session_id, technique);
            }
            ClientEvent::Vote { value } => {
                self.cast_vote(&mut state, conn, value)?;
            }
            ClientEvent::StartTheVoting { session_id } => {
                let Some(session) = admin_session_mut(&mut state, conn, session_id) else {
                    return Ok(());
                };
                session.start_voting();
                self.broadcast(&state, session_id, ServerEvent::VotingActive);
            }
            ClientEvent::RevealVotes { session_id } => {
                let Some(session) = admin_session_mut(&mut state, conn, session_id) else {
                    return Ok(());
                };
                if session.reveal_votes() {
                    self.broadcast(&state, session_id, ServerEvent::VotesRevealed);
                }
            }
            ClientEvent::RestartVoting { session_id } => {
                let Some(session) = admin_session_mut(&mut state, conn, session_id) else {
                    return Ok(());
                };
                session.restart_voting();
                self.broadcast(&state, session_id, ServerEvent::VotingReset);
            }
            ClientEvent::AdminInput { session_id, text } => {
                let Some(session) = admin_session_mut(&mut state, conn, session_id) else {
                    return Ok(());
                };
                session.ticket_text = Some(text.clone());
                self.broadcast(&state, session_id, ServerEvent::AdminInput { text });
            }
            ClientEvent::KickUser {
                session_id,
                username,
            } => {
                self.kick_user(&mut state, conn, session_id, username);
            }
            ClientEvent::UsernameChanged {
                session_id,
                username,
                old_username,
            } => {
                self.rename_user(&mut state, conn, session_id, username, old_username)?;
            }
        }
        Ok(())
    }

    /// Tear down a connection: user-list removal, `user-left` broadcast,
    /// and, when the admin drops, the grace-period reaper. Takes the hub by
    /// `Arc` because the reaper task needs its own handle.
    pub async fn disconnect(self: Arc<Self>, conn: ConnectionId) {
        self.peers.remove(&conn);
        let mut state = self.state.lock().await;
        let Some(conn_state) = state.conns.remove(&conn) else {
            return;
        };
        let (Some(session_id), Some(username)) = (conn_state.session_id, conn_state.username)
        else {
            return;
        };
        let Some(session) = state.registry.get_mut(session_id) else {
            return;
        };

        let was_admin = session.is_admin(conn);
        session.remove_user(&username);
        let users = session.users.clone();

        if was_admin {
            let grace = self.config.admin_grace;
            let hub = Arc::clone(&self);
            let timer = tokio::spawn(async move {
                tokio::time::sleep(grace).await;
                hub.expire_session(session_id).await;
            });
            session.begin_reclaim_window(Instant::now() + grace, timer);
            info!(
                target: "plancast::hub",
                "Admin {} left session {}; reaping in {:?} unless reclaimed",
                username, session_id, grace
            );
        }

        self.broadcast(&state, session_id, ServerEvent::UserLeft { username, users });
    }

    /// Reaper body: fires after the grace period. The seat re-check makes
    /// a lost race against `abort()` harmless — a reclaimed session is left
    /// alone even if the timer already fired.
    async fn expire_session(&self, session_id: Uuid) {
        let mut state = self.state.lock().await;
        let Some(session) = state.registry.get(session_id) else {
            return;
        };
        if !matches!(session.admin_seat, AdminSeat::PendingReclaim { .. }) {
            return;
        }

        self.broadcast(
            &state,
            session_id,
            ServerEvent::Error {
                title: "The Host Has Left".to_string(),
                message: format!(
                    "This session is no longer active since the host has left for more than {} seconds.",
                    self.config.admin_grace.as_secs()
                ),
            },
        );
        if let Some(session) = state.registry.remove(session_id) {
            let lifetime = chrono::Utc::now() - session.created_at;
            info!(
                target: "plancast::hub",
                "Session {} reaped after {}s", session_id, lifetime.num_seconds()
            );
        }
    }

    /// Number of live sessions, for the health surface.
    pub async fn session_count(&self) -> usize {
        self.state.lock().await.registry.len()
    }

    fn create_session(
        &self,
        state: &mut HubState,
        conn: ConnectionId,
        admin_username: Option<String>,
    ) {
        // An empty admin name means an open session.
        let admin_username = admin_username.filter(|name| !name.is_empty());
        let session_id = state.registry.create(admin_username);
        info!(target: "plancast::hub", "Session {} created", session_id);
        self.send_to(conn, ServerEvent::SessionCreated { session_id });
    }

    fn join_session(
        &self,
        state: &mut HubState,
        conn: ConnectionId,
        session_id: Uuid,
        username: String,
    ) -> Result<()> {
        if !state.registry.contains(session_id) {
            self.send_to(
                conn,
                ServerEvent::Error {
                    title: "Session Not Found".to_string(),
                    message: "This session you are attempting to connect to does not exist."
                        .to_string(),
                },
            );
            return Ok(());
        }

        let conn_state = state
            .conns
            .get_mut(&conn)
            .ok_or(PlancastError::ConnectionNotRegistered(conn))?;
        conn_state.session_id = Some(session_id);
        conn_state.username = Some(username.clone());

        let Some(session) = state.registry.get_mut(session_id) else {
            return Ok(());
        };
        if session.try_claim_seat(conn, &username) {
            debug!(
                target: "plancast::hub",
                "Connection {} took the admin seat of session {}", conn, session_id
            );
        }
        session.add_user(&username);
        let snapshot = session.snapshot(&username, None);
        self.broadcast(&state, session_id, ServerEvent::UserJoined(snapshot));
        Ok(())
    }

    // Any member may append; the log is shared, not admin-owned.
    fn add_history_event(&self, state: &mut HubState, session_id: Uuid, event: Value) {
        let Some(session) = state.registry.get_mut(session_id) else {
            return;
        };
        session.history.push(event);
        let history = session.history.clone();
        self.broadcast(&state, session_id, ServerEvent::HistoryUpdated { history });
    }

    fn change_sizing_technique(
        &self,
        state: &mut HubState,
        conn: ConnectionId,
        session_id: Uuid,
        technique: SizingTechnique,
    ) {
        let Some(session) = admin_session_mut(state, conn, session_id) else {
            return;
        };
        session.change_sizing_technique(technique);
        self.broadcast(
            &state,
            session_id,
            ServerEvent::SizingTechniqueChanged { technique },
        );
    }

    fn cast_vote(&self, state: &mut HubState, conn: ConnectionId, value: String) -> Result<()> {
        let conn_state = state
            .conns
            .get(&conn)
            .ok_or(PlancastError::ConnectionNotRegistered(conn))?;
        let (Some(session_id), Some(username)) =
            (conn_state.session_id, conn_state.username.clone())
        else {
            return Ok(());
        };
        // A deleted session leaves a stale id on the connection; treat it
        // as not-found and drop the vote.
        let Some(session) = state.registry.get_mut(session_id) else {
            return Ok(());
        };
        if session.cast_vote(&username, value.clone()) {
            self.broadcast(
                &state,
                session_id,
                ServerEvent::Vote {
                    username,
                    vote: value,
                },
            );
        }
        Ok(())
    }

    fn kick_user(
        &self,
        state: &mut HubState,
        conn: ConnectionId,
        session_id: Uuid,
        username: String,
    ) {
        let Some(session) = admin_session_mut(state, conn, session_id) else {
            return;
        };
        session.remove_user(&username);
        let users = session.users.clone();
        self.broadcast(
            &state,
            session_id,
            ServerEvent::UserKicked {
                username: username.clone(),
                users,
            },
        );
        // The kicked member keeps their connection; they get a personal
        // notice on top of the room update.
        self.send_to_username(
            state,
            session_id,
            &username,
            ServerEvent::Kicked {
                message: "You have been kicked from the session.".to_string(),
            },
        );
    }

    fn rename_user(
        &self,
        state: &mut HubState,
        conn: ConnectionId,
        session_id: Uuid,
        username: String,
        old_username: String,
    ) -> Result<()> {
        if !state.registry.contains(session_id) {
            return Ok(());
        }
        let conn_state = state
            .conns
            .get_mut(&conn)
            .ok_or(PlancastError::ConnectionNotRegistered(conn))?;
        conn_state.username = Some(username.clone());

        let Some(session) = state.registry.get_mut(session_id) else {
            return Ok(());
        };
        // The old name's vote is dropped, not migrated: the new name starts
        // the round unvoted.
        session.remove_user(&old_username);
        session.add_user(&username);
        let snapshot = session.snapshot(&username, Some(old_username));
        self.broadcast(&state, session_id, ServerEvent::UserJoined(snapshot));
        Ok(())
    }

    fn send_to(&self, conn: ConnectionId, event: ServerEvent) {
        if let Some(peer) = self.peers.get(&conn) {
            let _ = peer.send(event);
        }
    }

    /// Deliver to every connection attached to the session's room.
    fn broadcast(&self, state: &HubState, session_id: Uuid, event: ServerEvent) {
        for (conn, conn_state) in &state.conns {
            if conn_state.session_id == Some(session_id) {
                if let Some(peer) = self.peers.get(conn) {
                    let _ = peer.send(event.clone());
                }
            }
        }
    }

    /// Targeted delivery by display name: every connection currently
    /// attached to the session under that name (possibly none).
    fn send_to_username(
        &self,
        state: &HubState,
        session_id: Uuid,
        username: &str,
        event: ServerEvent,
    ) {
        for (conn, conn_state) in &state.conns {
            if conn_state.session_id == Some(session_id)
                && conn_state.username.as_deref() == Some(username)
            {
                if let Some(peer) = self.peers.get(conn) {
                    let _ = peer.send(event.clone());
                }
            }
        }
    }
}

/// Privileged-action gate: the session must exist and the caller must hold
/// the admin seat. `None` means the event is silently dropped.
fn admin_session_mut(
    state: &mut HubState,
    conn: ConnectionId,
    session_id: Uuid,
) -> Option<&mut Session> {
    state
        .registry
        .get_mut(session_id)
        .filter(|session| session.is_admin(conn))
}

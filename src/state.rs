//! Gate state machine.
//!
//! Defines the gate's state, the events that drive it and a pure transition
//! function. Side effects (remote lookups, navigation) are described by the
//! returned [`GateAction`]s and by [`redirect`](crate::routes::redirect); the
//! driver in [`gate`](crate::gate) performs them.

use tracing::debug;

use crate::error::Result;
use crate::ports::ProfileCompletion;
use crate::session::{AuthChange, Session, UserId};

/// Coarse gate phase derived from a [`GateState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatePhase {
    /// The driver has not started yet.
    Init,
    /// Session lookup or completeness lookup in flight. Blocking loading state.
    Loading,
    /// No session. Landing, login and signup are reachable.
    Unauthenticated,
    /// Session present, profile not complete.
    NeedsProfile,
    /// Session present, profile complete. The main application is reachable.
    Ready,
}

impl GatePhase {
    pub fn is_loading(self) -> bool {
        matches!(self, GatePhase::Init | GatePhase::Loading)
    }
}

/// Identifies the session a completeness lookup was issued for.
///
/// `epoch` increases on every session change, so a lookup issued for user A,
/// followed by a sign-out and a new sign-in of the same user A, is still
/// recognised as stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckTicket {
    pub user_id: UserId,
    pub epoch: u64,
}

/// Result of a completeness lookup as fed back into the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The profile row carries `is_profile_complete = true`.
    Complete,
    /// The row exists but is not marked complete.
    Incomplete,
    /// No profile row for the user.
    Missing,
    /// The lookup failed or timed out.
    Failed(String),
}

impl CompletionOutcome {
    pub fn from_lookup(lookup: Result<Option<ProfileCompletion>>) -> Self {
        match lookup {
            Ok(Some(row)) if row.is_complete() => CompletionOutcome::Complete,
            Ok(Some(_)) => CompletionOutcome::Incomplete,
            Ok(None) => CompletionOutcome::Missing,
            Err(e) => CompletionOutcome::Failed(e.to_string()),
        }
    }

    /// Only an explicit `true` grants access; everything else fails closed.
    pub fn is_complete(&self) -> bool {
        matches!(self, CompletionOutcome::Complete)
    }
}

/// Events that drive the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    /// The driver started; `location` is the router's current path.
    Started { location: String },
    /// The one-shot session lookup resolved.
    InitialSession(Option<Session>),
    /// The auth subscription reported a change.
    AuthChanged(AuthChange),
    /// A completeness lookup finished.
    CompletionResolved {
        ticket: CheckTicket,
        outcome: CompletionOutcome,
    },
    /// The completion form was saved for `user_id`.
    ProfileSaved { user_id: UserId },
    /// The router is now showing `path`.
    Navigated { path: String },
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateAction {
    /// Look up the completeness flag for the ticket's user.
    FetchCompletion(CheckTicket),
}

/// Client-local gate state. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateState {
    started: bool,
    auth_loading: bool,
    session: Option<Session>,
    profile_complete: Option<bool>,
    location: String,
    epoch: u64,
}

impl Default for GateState {
    fn default() -> Self {
        Self::new()
    }
}

impl GateState {
    /// A gate that has not seen its router yet. Its phase is [`GatePhase::Init`].
    pub fn new() -> Self {
        Self {
            started: false,
            auth_loading: true,
            session: None,
            profile_complete: None,
            location: String::new(),
            epoch: 0,
        }
    }

    /// `true` until the initial session lookup or the first auth change has
    /// resolved.
    pub fn auth_loading(&self) -> bool {
        self.auth_loading
    }

    /// The session currently held, if the visitor is signed in.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Shortcut for the held session's user id.
    pub fn user_id(&self) -> Option<&UserId> {
        self.session.as_ref().map(|s| &s.user_id)
    }

    /// `None` while the flag is unknown for the current session.
    pub fn profile_complete(&self) -> Option<bool> {
        self.profile_complete
    }

    /// Last path the router was known to show. Empty before [`GateEvent::Started`].
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Session generation counter.
    ///
    /// Incremented whenever a sign-in starts a new completeness lookup or a
    /// sign-out drops the session, and copied into every [`CheckTicket`]. A
    /// token refresh for the same user leaves it unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use session_profile_gate::{AuthChange, GateEvent, GateState, Session};
    ///
    /// let (state, _) = GateState::new().apply(GateEvent::Started { location: "/".into() });
    /// let (state, _) = state.apply(GateEvent::AuthChanged(AuthChange::SignedIn(Session::new("u1", "t1"))));
    /// assert_eq!(state.epoch(), 1);
    ///
    /// let (state, _) = state.apply(GateEvent::AuthChanged(AuthChange::TokenRefreshed(Session::new("u1", "t2"))));
    /// assert_eq!(state.epoch(), 1);
    ///
    /// let (state, _) = state.apply(GateEvent::AuthChanged(AuthChange::SignedOut));
    /// assert_eq!(state.epoch(), 2);
    /// ```
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Derives the phase from the held facts. `Loading` covers both an
    /// unresolved session and an unknown flag for a signed-in visitor.
    pub fn phase(&self) -> GatePhase {
        if !self.started {
            return GatePhase::Init;
        }
        if self.auth_loading {
            return GatePhase::Loading;
        }
        match (&self.session, self.profile_complete) {
            (None, _) => GatePhase::Unauthenticated,
            (Some(_), None) => GatePhase::Loading,
            (Some(_), Some(false)) => GatePhase::NeedsProfile,
            (Some(_), Some(true)) => GatePhase::Ready,
        }
    }

    /// Whether `ticket` was issued for the session currently held.
    pub fn is_current(&self, ticket: &CheckTicket) -> bool {
        self.epoch == ticket.epoch && self.user_id() == Some(&ticket.user_id)
    }

    /// Applies `event` and returns the next state with the side effects it requires.
    pub fn apply(mut self, event: GateEvent) -> (GateState, Vec<GateAction>) {
        match event {
            GateEvent::Started { location } => {
                self.started = true;
                self.location = location;
                (self, Vec::new())
            }
            GateEvent::InitialSession(session) => {
                self.auth_loading = false;
                self.replace_session(session, true)
            }
            GateEvent::AuthChanged(change) => {
                self.auth_loading = false;
                match change {
                    AuthChange::SignedIn(session) => self.replace_session(Some(session), true),
                    AuthChange::TokenRefreshed(session) => {
                        self.replace_session(Some(session), false)
                    }
                    AuthChange::SignedOut => self.replace_session(None, true),
                }
            }
            GateEvent::CompletionResolved { ticket, outcome } => {
                if !self.is_current(&ticket) {
                    debug!(
                        user_id = %ticket.user_id,
                        epoch = ticket.epoch,
                        current_epoch = self.epoch,
                        "discarding stale completeness result"
                    );
                    return (self, Vec::new());
                }
                // A save that landed while the lookup was in flight is newer.
                if self.profile_complete.is_none() {
                    self.profile_complete = Some(outcome.is_complete());
                }
                (self, Vec::new())
            }
            GateEvent::ProfileSaved { user_id } => {
                if self.user_id() == Some(&user_id) {
                    self.profile_complete = Some(true);
                } else {
                    debug!(%user_id, "ignoring profile save for another user");
                }
                (self, Vec::new())
            }
            GateEvent::Navigated { path } => {
                self.location = path;
                (self, Vec::new())
            }
        }
    }

    /// Swaps the held session. `fresh` forces a new completeness lookup even
    /// when the user id is unchanged (a new sign-in rather than a refresh).
    fn replace_session(
        mut self,
        session: Option<Session>,
        fresh: bool,
    ) -> (GateState, Vec<GateAction>) {
        match session {
            None => {
                if self.session.take().is_some() {
                    self.epoch += 1;
                }
                self.profile_complete = None;
                (self, Vec::new())
            }
            Some(session) if !fresh && self.user_id() == Some(&session.user_id) => {
                self.session = Some(session);
                (self, Vec::new())
            }
            Some(session) => {
                self.profile_complete = None;
                self.epoch += 1;
                let ticket = CheckTicket {
                    user_id: session.user_id.clone(),
                    epoch: self.epoch,
                };
                self.session = Some(session);
                (self, vec![GateAction::FetchCompletion(ticket)])
            }
        }
    }
}

//! The gate driver.
//!
//! [`ProfileGate`] owns the single [`GateState`], feeds it events from the
//! auth subscription, the completeness lookups it spawns and the view layer,
//! and performs the side effects each transition asks for. The view layer
//! only reads [`GateView`] snapshots and reports back through a
//! [`GateHandle`].

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::GateConfig;
use crate::error::Error;
use crate::ports::{AuthProvider, ProfileCompletionSource, Router};
use crate::routes;
use crate::session::{AuthChange, Session, UserId};
use crate::state::{CheckTicket, CompletionOutcome, GateAction, GateEvent, GatePhase, GateState};

/// Read-only snapshot published to the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateView {
    pub phase: GatePhase,
    pub user_id: Option<UserId>,
}

impl GateView {
    fn of(state: &GateState) -> Self {
        Self {
            phase: state.phase(),
            user_id: state.user_id().cloned(),
        }
    }

    /// The main application may be rendered.
    pub fn shows_app(&self) -> bool {
        self.phase == GatePhase::Ready
    }

    /// A blocking loading indicator must be rendered instead of any screen.
    pub fn shows_loading(&self) -> bool {
        self.phase.is_loading()
    }
}

enum Command {
    Event(GateEvent),
    Shutdown,
}

/// Cloneable sender the view layer uses to report back to a running gate.
///
/// Report every navigation through [`navigated`](Self::navigated) so the
/// gate re-evaluates as soon as the visitor moves. A move that goes
/// unreported (a native back gesture, a deep link) is still picked up, but
/// only when the next event reaches the gate, since the router path is
/// re-read then.
#[derive(Clone)]
pub struct GateHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl GateHandle {
    /// The router now shows `path` (user navigation, back action, deep link).
    pub fn navigated(&self, path: impl Into<String>) {
        self.send(GateEvent::Navigated { path: path.into() });
    }

    /// The profile-completion form was saved for `user_id`.
    pub fn profile_saved(&self, user_id: UserId) {
        self.send(GateEvent::ProfileSaved { user_id });
    }

    /// Stops [`ProfileGate::run`] after the events already queued.
    pub fn shutdown(&self) {
        if self.tx.send(Command::Shutdown).is_err() {
            debug!("gate already stopped");
        }
    }

    fn send(&self, event: GateEvent) {
        if self.tx.send(Command::Event(event)).is_err() {
            debug!("gate stopped, dropping event");
        }
    }
}

/// Session/profile gate wired to its collaborators.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use session_profile_gate::{AuthProvider, GateConfig, ProfileCompletionSource, ProfileGate, Router};
///
/// # async fn example<A, P, R>(auth: Arc<A>, profiles: Arc<P>, router: Arc<R>)
/// # where
/// #     A: AuthProvider + 'static,
/// #     P: ProfileCompletionSource + 'static,
/// #     R: Router + 'static,
/// # {
/// let gate = ProfileGate::new(auth, profiles, router, GateConfig::new());
/// let mut view = gate.subscribe();
/// let handle = gate.handle();
///
/// tokio::spawn(gate.run());
///
/// // Render from the published view.
/// view.changed().await.ok();
/// if view.borrow().shows_loading() {
///     // draw the spinner
/// }
///
/// handle.shutdown();
/// # }
/// ```
pub struct ProfileGate<A: ?Sized, P: ?Sized, R: ?Sized> {
    auth: Arc<A>,
    profiles: Arc<P>,
    router: Arc<R>,
    config: GateConfig,
    state: GateState,
    commands_tx: mpsc::UnboundedSender<Command>,
    commands_rx: mpsc::UnboundedReceiver<Command>,
    view_tx: watch::Sender<GateView>,
}

impl<A, P, R> ProfileGate<A, P, R>
where
    A: AuthProvider + ?Sized + 'static,
    P: ProfileCompletionSource + ?Sized + 'static,
    R: Router + ?Sized,
{
    pub fn new(auth: Arc<A>, profiles: Arc<P>, router: Arc<R>, config: GateConfig) -> Self {
        let state = GateState::new();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (view_tx, _) = watch::channel(GateView::of(&state));
        Self {
            auth,
            profiles,
            router,
            config,
            state,
            commands_tx,
            commands_rx,
            view_tx,
        }
    }

    pub fn handle(&self) -> GateHandle {
        GateHandle {
            tx: self.commands_tx.clone(),
        }
    }

    /// Subscribes to view snapshots. Only changed snapshots are published.
    pub fn subscribe(&self) -> watch::Receiver<GateView> {
        self.view_tx.subscribe()
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn view(&self) -> GateView {
        GateView::of(&self.state)
    }

    /// Records the router's current location and resolves the initial session.
    pub async fn start(&mut self) {
        let location = self.router.current_path();
        info!(%location, "starting gate");
        self.dispatch(GateEvent::Started { location });

        let session = self.lookup_session().await;
        self.dispatch(GateEvent::InitialSession(session));
    }

    /// Processes auth changes and queued events until [`GateHandle::shutdown`].
    ///
    /// If the auth subscription closes the gate keeps running in its last
    /// known state; if it lags, the current session is re-read.
    pub async fn run(mut self) {
        let mut auth_changes = Some(self.auth.subscribe());
        self.start().await;

        loop {
            tokio::select! {
                command = self.commands_rx.recv() => match command {
                    Some(Command::Event(event)) => self.dispatch(event),
                    Some(Command::Shutdown) | None => break,
                },
                change = next_auth_change(&mut auth_changes) => match change {
                    Ok(change) => {
                        let change = admit(change);
                        self.dispatch(GateEvent::AuthChanged(change));
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "auth subscription lagged, re-reading session");
                        let change = match self.lookup_session().await {
                            Some(session) => AuthChange::TokenRefreshed(session),
                            None => AuthChange::SignedOut,
                        };
                        self.dispatch(GateEvent::AuthChanged(change));
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!("auth subscription closed, keeping last known state");
                        auth_changes = None;
                    }
                },
            }
        }

        info!("gate stopped");
    }

    /// Waits for one queued event and applies it. Returns `false` once a
    /// shutdown was requested.
    pub async fn process_next(&mut self) -> bool {
        match self.commands_rx.recv().await {
            Some(Command::Event(event)) => {
                self.dispatch(event);
                true
            }
            Some(Command::Shutdown) | None => false,
        }
    }

    /// Applies `event`, performs the resulting side effects and publishes the
    /// new view.
    ///
    /// Before any event other than [`GateEvent::Started`] or
    /// [`GateEvent::Navigated`], the router's current path is re-read. If the
    /// router moved without the move being reported, the gate catches up on
    /// it first, redirecting if the new location calls for it.
    ///
    /// At most one navigation command is issued per transition; the new
    /// location is fed back as [`GateEvent::Navigated`] before returning.
    pub fn dispatch(&mut self, event: GateEvent) {
        let reported = matches!(
            event,
            GateEvent::Started { .. } | GateEvent::Navigated { .. }
        );
        if !reported && self.state.phase() != GatePhase::Init {
            let path = self.router.current_path();
            if path != self.state.location() {
                debug!(from = %self.state.location(), to = %path, "router moved without a report");
                self.step(GateEvent::Navigated { path });
            }
        }
        self.step(event);

        let view = GateView::of(&self.state);
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }

    fn step(&mut self, event: GateEvent) {
        let mut pending = Some(event);
        while let Some(event) = pending.take() {
            let previous = self.state.clone();
            let (next, actions) = previous.clone().apply(event);
            self.state = next;

            if previous.phase() != self.state.phase() {
                info!(from = ?previous.phase(), to = ?self.state.phase(), "gate phase changed");
            }

            for action in actions {
                self.perform(action);
            }

            if let Some(redirect) = routes::redirect(&previous, &self.state, self.config.routes())
            {
                info!(
                    from = %self.state.location(),
                    to = %redirect.path(),
                    phase = ?self.state.phase(),
                    "redirecting"
                );
                self.router.replace(redirect.path());
                pending = Some(GateEvent::Navigated {
                    path: redirect.path().to_string(),
                });
            }
        }
    }

    fn perform(&self, action: GateAction) {
        match action {
            GateAction::FetchCompletion(ticket) => self.spawn_completion_check(ticket),
        }
    }

    fn spawn_completion_check(&self, ticket: CheckTicket) {
        let profiles = Arc::clone(&self.profiles);
        let tx = self.commands_tx.clone();
        let timeout = self.config.fetch_timeout();
        debug!(user_id = %ticket.user_id, epoch = ticket.epoch, "checking profile completeness");

        tokio::spawn(async move {
            let lookup = match tokio::time::timeout(
                timeout,
                profiles.fetch_profile_completion(&ticket.user_id),
            )
            .await
            {
                Ok(lookup) => lookup,
                Err(_) => Err(Error::Timeout(timeout)),
            };
            if let Err(e) = &lookup {
                warn!(
                    user_id = %ticket.user_id,
                    error = %e,
                    "completeness lookup failed, treating profile as incomplete"
                );
            }
            let outcome = CompletionOutcome::from_lookup(lookup);
            let event = GateEvent::CompletionResolved { ticket, outcome };
            if tx.send(Command::Event(event)).is_err() {
                debug!("gate stopped before completeness lookup resolved");
            }
        });
    }

    async fn lookup_session(&self) -> Option<Session> {
        match self.auth.current_session().await {
            Ok(Some(session)) if session.is_expired() => {
                info!(user_id = %session.user_id, "stored session expired");
                None
            }
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "session lookup failed, treating visitor as signed out");
                None
            }
        }
    }
}

/// Expired credentials are treated as a sign-out.
fn admit(change: AuthChange) -> AuthChange {
    match change.session() {
        Some(session) if session.is_expired() => {
            info!(user_id = %session.user_id, "ignoring expired session from auth change");
            AuthChange::SignedOut
        }
        _ => change,
    }
}

async fn next_auth_change(
    rx: &mut Option<broadcast::Receiver<AuthChange>>,
) -> Result<AuthChange, broadcast::error::RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

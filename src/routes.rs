//! Destination paths and the navigation decision.

use crate::state::{GatePhase, GateState};

/// The gate's fixed set of destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    pub landing: String,
    pub login: String,
    pub signup: String,
    pub complete_profile: String,
    pub home: String,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            landing: "/".to_string(),
            login: "/login".to_string(),
            signup: "/signup".to_string(),
            complete_profile: "/complete-profile".to_string(),
            home: "/home".to_string(),
        }
    }
}

/// What kind of screen a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Landing,
    Login,
    Signup,
    CompleteProfile,
    /// Anything inside the main application.
    App,
}

impl RouteKind {
    /// Screens an unauthenticated visitor may stay on.
    pub fn is_public(self) -> bool {
        matches!(self, RouteKind::Landing | RouteKind::Login | RouteKind::Signup)
    }
}

/// A navigation command. Always replaces the current history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    Replace(String),
}

impl Redirect {
    pub fn path(&self) -> &str {
        match self {
            Redirect::Replace(path) => path,
        }
    }
}

impl Routes {
    /// Classifies `path` by its first segment. Query strings, fragments and
    /// trailing slashes are ignored; `index` is treated as the landing page.
    pub fn classify(&self, path: &str) -> RouteKind {
        let segment = first_segment(path);
        if segment.is_empty() || segment == "index" || segment == first_segment(&self.landing) {
            RouteKind::Landing
        } else if segment == first_segment(&self.login) {
            RouteKind::Login
        } else if segment == first_segment(&self.signup) {
            RouteKind::Signup
        } else if segment == first_segment(&self.complete_profile) {
            RouteKind::CompleteProfile
        } else {
            RouteKind::App
        }
    }

    /// Where a visitor in `phase` standing on `location` must be sent, if anywhere.
    pub fn destination(&self, phase: GatePhase, location: &str) -> Option<&str> {
        let kind = self.classify(location);
        match phase {
            GatePhase::Init | GatePhase::Loading => None,
            GatePhase::Unauthenticated if !kind.is_public() => Some(self.landing.as_str()),
            GatePhase::NeedsProfile if kind != RouteKind::CompleteProfile => {
                Some(self.complete_profile.as_str())
            }
            GatePhase::Ready if kind.is_public() => Some(self.home.as_str()),
            _ => None,
        }
    }
}

/// Computes the navigation command for the transition `previous -> next`.
///
/// Returns `None` when nothing changed, so replaying the same state never
/// issues a second command.
pub fn redirect(previous: &GateState, next: &GateState, routes: &Routes) -> Option<Redirect> {
    if previous == next {
        return None;
    }
    routes
        .destination(next.phase(), next.location())
        .filter(|target| routes.classify(target) != routes.classify(next.location()))
        .map(|target| Redirect::Replace(target.to_string()))
}

pub(crate) fn first_segment(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
}

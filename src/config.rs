//! Gate configuration.

use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::routes::{first_segment, Routes};

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime settings for a [`ProfileGate`](crate::ProfileGate).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use session_profile_gate::{GateConfig, Routes};
///
/// let config = GateConfig::new()
///     .with_fetch_timeout(Duration::from_secs(5))
///     .with_routes(Routes {
///         home: "/tabs/home".to_string(),
///         ..Routes::default()
///     });
///
/// assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
/// assert_eq!(config.routes().home, "/tabs/home");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    routes: Routes,
    fetch_timeout: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GateConfig {
    /// Default routes and a 10 second completeness lookup timeout.
    pub fn new() -> Self {
        Self {
            routes: Routes::default(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_routes(mut self, routes: Routes) -> Self {
        self.routes = routes;
        self
    }

    /// Bounds each completeness lookup. A lookup that exceeds it counts as
    /// an incomplete profile.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Reads settings from `GATE_*` environment variables, keeping defaults
    /// for unset ones.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Routes::default();
        let routes = Routes {
            landing: path_or(&lookup, "GATE_LANDING_PATH", defaults.landing)?,
            login: path_or(&lookup, "GATE_LOGIN_PATH", defaults.login)?,
            signup: path_or(&lookup, "GATE_SIGNUP_PATH", defaults.signup)?,
            complete_profile: path_or(
                &lookup,
                "GATE_COMPLETE_PROFILE_PATH",
                defaults.complete_profile,
            )?,
            home: path_or(&lookup, "GATE_HOME_PATH", defaults.home)?,
        };
        check_distinct(&routes)?;

        let timeout_ms: u64 = parse_or(
            &lookup,
            "GATE_FETCH_TIMEOUT_MS",
            DEFAULT_FETCH_TIMEOUT.as_millis() as u64,
        )?;
        if timeout_ms == 0 {
            warn!("Invalid GATE_FETCH_TIMEOUT_MS value: 0");
            return Err(Error::Config {
                key: "GATE_FETCH_TIMEOUT_MS",
                reason: "timeout must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            routes,
            fetch_timeout: Duration::from_millis(timeout_ms),
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            Error::Config {
                key,
                reason: e.to_string(),
            }
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn path_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: String,
) -> Result<String> {
    let path: String = parse_or(lookup, key, default)?;
    if !path.starts_with('/') {
        warn!("Invalid {key} value: {path}");
        return Err(Error::Config {
            key,
            reason: format!("path `{path}` must start with `/`"),
        });
    }
    Ok(path)
}

// Routes are told apart by first segment, so no two may share one.
fn check_distinct(routes: &Routes) -> Result<()> {
    let named = [
        ("GATE_LANDING_PATH", routes.landing.as_str()),
        ("GATE_LOGIN_PATH", routes.login.as_str()),
        ("GATE_SIGNUP_PATH", routes.signup.as_str()),
        ("GATE_COMPLETE_PROFILE_PATH", routes.complete_profile.as_str()),
        ("GATE_HOME_PATH", routes.home.as_str()),
    ];
    let landing = first_segment(routes.landing.as_str());

    for (i, &(key, path)) in named.iter().enumerate().skip(1) {
        let segment = first_segment(path);
        let clash = if segment.is_empty() || segment == "index" || segment == landing {
            Some(named[0].1)
        } else {
            named[1..i]
                .iter()
                .find(|(_, other)| first_segment(other) == segment)
                .map(|(_, other)| *other)
        };
        if let Some(other) = clash {
            warn!("Invalid {key} value: {path}");
            return Err(Error::Config {
                key,
                reason: format!("path `{path}` shares its first segment with `{other}`"),
            });
        }
    }
    Ok(())
}

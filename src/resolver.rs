// src/resolver.rs
//! Startup session resolution.
//!
//! Decides where the app lands (login, device registration, or home) from
//! the stored token, the platform device identifier, the locally cached
//! device identifier, and at most one call to the device-check endpoint.
//!
//! The decision itself is a pure state machine ([`BootstrapMachine`]). The
//! only side effects are the two [`BootstrapAction`]s it can emit once the
//! network result is fully in hand: caching the confirmed identifier and
//! clearing credentials on a 401. Failures never escape; anything short of a
//! definitive answer falls back to the local cache.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::DeviceGateway;
use crate::error::ApiError;
use crate::store::{CredentialStore, DeviceCache};
use crate::types::DeviceCheck;

/// Identifier the platform reports when it cannot provide one.
pub const UNKNOWN_DEVICE: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationTarget {
    Login,
    DeviceRegistration,
    Home,
}

impl NavigationTarget {
    pub fn route(self) -> &'static str {
        match self {
            NavigationTarget::Login => "login",
            NavigationTarget::DeviceRegistration => "device_registration",
            NavigationTarget::Home => "home",
        }
    }
}

impl std::fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.route())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapState {
    Init,
    CheckingToken,
    CheckingDevice,
    Resolved(NavigationTarget),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapEvent {
    /// Stored access token was read.
    TokenLoaded { present: bool },
    /// Platform identifier was probed.
    IdentifierProbed { available: bool },
    /// Device-check call returned.
    CheckCompleted(Result<DeviceCheck, ApiError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapAction {
    /// Issue the device-check call.
    CheckDevice,
    /// Persist the backend-confirmed identifier.
    CacheDevice { device_identifier: String },
    /// Forget the stored credentials.
    ClearCredentials,
}

/// Pure startup state machine. `Resolved` is terminal: later events are
/// ignored, so there is no path back into `CheckingDevice`.
#[derive(Debug, Clone)]
pub struct BootstrapMachine {
    state: BootstrapState,
    has_cached_device: bool,
}

impl BootstrapMachine {
    pub fn new(has_cached_device: bool) -> Self {
        Self {
            state: BootstrapState::Init,
            has_cached_device,
        }
    }

    pub fn state(&self) -> &BootstrapState {
        &self.state
    }

    pub fn target(&self) -> Option<NavigationTarget> {
        match self.state {
            BootstrapState::Resolved(t) => Some(t),
            _ => None,
        }
    }

    fn fallback(&self) -> NavigationTarget {
        if self.has_cached_device {
            NavigationTarget::Home
        } else {
            NavigationTarget::DeviceRegistration
        }
    }

    pub fn handle(&mut self, event: BootstrapEvent) -> Vec<BootstrapAction> {
        use BootstrapEvent::*;
        use BootstrapState::*;

        let (next, actions) = match (&self.state, event) {
            (Init, TokenLoaded { present: false }) => (Resolved(NavigationTarget::Login), vec![]),
            (Init, TokenLoaded { present: true }) => (CheckingToken, vec![]),

            (CheckingToken, IdentifierProbed { available: false }) => {
                (Resolved(self.fallback()), vec![])
            }
            (CheckingToken, IdentifierProbed { available: true }) => {
                (CheckingDevice, vec![BootstrapAction::CheckDevice])
            }

            (CheckingDevice, CheckCompleted(Ok(DeviceCheck::Registered { device }))) => (
                Resolved(NavigationTarget::Home),
                vec![BootstrapAction::CacheDevice {
                    device_identifier: device.device_identifier,
                }],
            ),
            (CheckingDevice, CheckCompleted(Ok(DeviceCheck::NotRegistered))) => {
                (Resolved(NavigationTarget::DeviceRegistration), vec![])
            }
            (CheckingDevice, CheckCompleted(Err(ApiError::Unauthorized { .. }))) => (
                Resolved(NavigationTarget::Login),
                vec![BootstrapAction::ClearCredentials],
            ),
            (CheckingDevice, CheckCompleted(Err(e))) => {
                warn!("device check failed, using local cache: {e}");
                (Resolved(self.fallback()), vec![])
            }

            (state, event) => {
                debug!("ignoring {event:?} in {state:?}");
                return vec![];
            }
        };

        self.state = next;
        actions
    }
}

/// What a resolution decided, plus the side effect still to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub target: NavigationTarget,
    pub effect: Option<BootstrapAction>,
}

/// Normalises a platform identifier; empty, blank and `unknown` are absent.
pub fn usable_identifier(id: Option<&str>) -> Option<&str> {
    id.map(str::trim)
        .filter(|s| !s.is_empty() && *s != UNKNOWN_DEVICE)
}

/// Runs the decision table. `check` is awaited at most once and only when a
/// token is held and an identifier is available. Effects are returned, not
/// applied, so a dropped future leaves no partial writes.
pub async fn resolve<F, Fut>(
    has_token: bool,
    device_identifier: Option<&str>,
    cached_device_identifier: Option<&str>,
    check: F,
) -> Resolution
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<DeviceCheck, ApiError>>,
{
    let has_cached = cached_device_identifier.is_some_and(|s| !s.trim().is_empty());
    let mut machine = BootstrapMachine::new(has_cached);
    let mut effect = None;

    machine.handle(BootstrapEvent::TokenLoaded { present: has_token });

    let identifier = usable_identifier(device_identifier);
    let actions = machine.handle(BootstrapEvent::IdentifierProbed {
        available: identifier.is_some(),
    });

    if let (Some(id), true) = (identifier, actions.contains(&BootstrapAction::CheckDevice)) {
        let outcome = check(id.to_string()).await;
        effect = machine
            .handle(BootstrapEvent::CheckCompleted(outcome))
            .into_iter()
            .next();
    }

    let target = machine.target().unwrap_or(NavigationTarget::Login);
    Resolution { target, effect }
}

/// Drives [`resolve`] against real collaborators and applies its effect.
/// Calls are serialised so two concurrent startups cannot interleave their
/// cache writes.
pub struct SessionResolver<G, S> {
    gateway: Arc<G>,
    store: Arc<S>,
    platform: String,
    in_flight: Mutex<()>,
}

impl<G, S> SessionResolver<G, S>
where
    G: DeviceGateway,
    S: CredentialStore + DeviceCache,
{
    pub fn new(gateway: Arc<G>, store: Arc<S>, platform: impl Into<String>) -> Self {
        Self {
            gateway,
            store,
            platform: platform.into(),
            in_flight: Mutex::new(()),
        }
    }

    pub async fn resolve(&self, device_identifier: Option<&str>) -> NavigationTarget {
        let _guard = self.in_flight.lock().await;
        let store = self.store.as_ref();

        let token = store.access_token().await.unwrap_or_else(|e| {
            warn!("could not read access token: {e}");
            None
        });
        let cached = DeviceCache::get(store).await.unwrap_or_else(|e| {
            warn!("could not read device cache: {e}");
            None
        });

        let gateway = self.gateway.as_ref();
        let platform = self.platform.as_str();
        let bearer = token.as_deref().unwrap_or_default();
        let resolution = resolve(token.is_some(), device_identifier, cached.as_deref(), |id| async move {
            gateway.check_device_registration(bearer, &id, platform).await
        })
        .await;

        match &resolution.effect {
            Some(BootstrapAction::CacheDevice { device_identifier }) => {
                if let Err(e) = DeviceCache::set(store, device_identifier).await {
                    warn!("could not cache device identifier: {e}");
                }
            }
            Some(BootstrapAction::ClearCredentials) => {
                info!("token rejected, logging out");
                if let Err(e) = CredentialStore::clear(store).await {
                    warn!("could not clear credentials: {e}");
                }
            }
            Some(BootstrapAction::CheckDevice) | None => {}
        }

        info!("startup resolved to {}", resolution.target);
        resolution.target
    }
}

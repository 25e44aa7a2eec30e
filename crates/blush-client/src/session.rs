//! Session store: the bearer token, the profile fetched for it, and the
//! navigation gate derived from both.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use blush_api::ApiError;
use blush_store::Store;
use blush_types::api::UserProfile;
use blush_types::events::{ClientEvent, Route};

use crate::backend::AccountApi;
use crate::events::EventSink;

/// Top-level area of the app the front end is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Auth,
    Onboarding,
    /// Tabs, chats, the admin console: everything behind sign-in
    Main,
    Modal,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub token: Option<String>,
    /// Only ever the profile fetched for the current `token`
    pub user: Option<UserProfile>,
    /// Hydration or sign-in still in progress
    pub loading: bool,
    generation: u64,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    /// Where the front end must go from `section`, if anywhere.
    pub fn redirect_for(&self, section: Section) -> Option<Route> {
        if self.loading {
            return None;
        }
        // Token present but profile not in yet: wait for it.
        if self.token.is_some() && self.user.is_none() {
            return None;
        }
        if section == Section::Modal {
            return None;
        }

        match &self.user {
            Some(user) if user.onboarding_completed => {
                matches!(section, Section::Auth | Section::Onboarding).then_some(Route::Profile)
            }
            Some(_) => (section != Section::Onboarding).then_some(Route::OnboardingName),
            None => (section != Section::Auth).then_some(Route::Welcome),
        }
    }

    /// First screen after launch; `None` while still loading.
    pub fn entry_route(&self) -> Option<Route> {
        if self.loading {
            return None;
        }
        match &self.user {
            Some(user) if user.onboarding_completed => Some(Route::Discovery),
            Some(_) => Some(Route::OnboardingName),
            None => Some(Route::Welcome),
        }
    }
}

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Arc<Store>,
    events: EventSink,
    state: RwLock<SessionState>,
}

impl Session {
    pub fn new(store: Arc<Store>, events: EventSink) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                store,
                events,
                state: RwLock::new(SessionState {
                    loading: true,
                    ..Default::default()
                }),
            }),
        }
    }

    pub async fn snapshot(&self) -> SessionState {
        self.inner.state.read().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.state.read().await.token.clone()
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.inner.state.read().await.user.clone()
    }

    pub async fn redirect_for(&self, section: Section) -> Option<Route> {
        self.inner.state.read().await.redirect_for(section)
    }

    pub async fn entry_route(&self) -> Option<Route> {
        self.inner.state.read().await.entry_route()
    }

    /// Restore the persisted token, if any, and validate it by fetching the
    /// profile.
    pub async fn hydrate<A: AccountApi>(&self, api: &A) {
        let stored = match self.inner.store.load_token() {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to read stored token: {}", e);
                None
            }
        };
        debug!("Hydrating session, token stored: {}", stored.is_some());

        if let Some(token) = stored {
            let generation = {
                let mut state = self.inner.state.write().await;
                state.generation += 1;
                state.token = Some(token.clone());
                state.user = None;
                state.generation
            };
            self.load_profile(api, &token, generation).await;
        }

        self.inner.state.write().await.loading = false;
    }

    pub async fn sign_in<A: AccountApi>(&self, api: &A, token: &str) {
        if let Err(e) = self.inner.store.save_token(token) {
            warn!("Failed to persist token: {}", e);
        }

        let generation = {
            let mut state = self.inner.state.write().await;
            state.generation += 1;
            state.token = Some(token.to_string());
            state.user = None;
            state.loading = true;
            state.generation
        };
        info!("Signed in, loading profile");

        self.load_profile(api, token, generation).await;
        self.inner.state.write().await.loading = false;
    }

    /// Re-fetch the profile for the current token.
    pub async fn refresh<A: AccountApi>(&self, api: &A) {
        let current = {
            let state = self.inner.state.read().await;
            state.token.clone().map(|t| (t, state.generation))
        };
        if let Some((token, generation)) = current {
            self.load_profile(api, &token, generation).await;
        }
    }

    pub async fn sign_out(&self, banned: bool) {
        if let Err(e) = self.inner.store.clear_token() {
            warn!("Failed to clear stored token: {}", e);
        }
        {
            let mut state = self.inner.state.write().await;
            state.generation += 1;
            state.token = None;
            state.user = None;
            state.loading = false;
        }
        info!("Signed out (banned: {})", banned);

        self.inner.events.emit(ClientEvent::SignedOut { banned });
        self.inner.events.navigate(Route::Welcome);
    }

    /// Shared handling for responses every screen reacts to the same way.
    /// Returns true when the error was dealt with here.
    pub async fn intercept(&self, err: &ApiError) -> bool {
        match err {
            ApiError::RateLimited => {
                warn!("Rate limited by the server");
                self.inner.events.emit(ClientEvent::RateLimited);
                self.inner
                    .events
                    .alert("Rate Limit", "Too many attempts. Try again in a minute.");
                true
            }
            ApiError::Banned(detail) => {
                warn!("Account banned: {}", detail);
                self.inner
                    .events
                    .alert("Access Denied", "Your account is restricted.");
                self.sign_out(true).await;
                true
            }
            _ => false,
        }
    }

    async fn load_profile<A: AccountApi>(&self, api: &A, token: &str, generation: u64) {
        let result = api.fetch_profile(token).await;

        let mut state = self.inner.state.write().await;
        if state.generation != generation {
            debug!("Discarding profile response for a replaced session");
            return;
        }

        match result {
            Ok(user) => {
                debug!(
                    "Profile loaded (onboarded: {})",
                    user.onboarding_completed
                );
                state.user = Some(user);
            }
            Err(e) if e.is_network() => {
                warn!("Profile fetch failed, keeping session: {}", e);
            }
            Err(e) => {
                drop(state);
                if !self.intercept(&e).await {
                    warn!("Token rejected ({}), signing out", e);
                    self.sign_out(false).await;
                }
            }
        }
    }
}

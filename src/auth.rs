//! Identity provider adapter.
//!
//! Sign-in is redirect based: an external, opaque asynchronous step whose
//! completion is observed via a state-change notification. The provider
//! holds the current signed-in identity in a watch channel; the web shell
//! performs the actual navigation to [`RedirectIdentityProvider::begin_sign_in`]'s
//! authorize URL and feeds the resulting ID token back through
//! [`RedirectIdentityProvider::complete_sign_in`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// The signed-in identity as reported by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    /// The provider's user id (`sub` claim).
    pub user_id: String,
    pub email: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Claims {
    pub sub: String,
    pub email: String,
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Option<Claims>;
}

pub struct Hs256Verifier {
    key: DecodingKey,
}

impl Hs256Verifier {
    pub fn new(secret: String) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[async_trait]
impl TokenVerifier for Hs256Verifier {
    async fn verify(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        decode::<Claims>(token, &self.key, &validation)
            .ok()
            .map(|d| d.claims)
    }
}

/// Wraps the third-party redirect sign-in flow behind a watch channel.
pub struct RedirectIdentityProvider {
    verifier: Arc<dyn TokenVerifier>,
    authorize_url: String,
    state: watch::Sender<Option<Identity>>,
    sign_ins_requested: AtomicU64,
}

impl RedirectIdentityProvider {
    pub fn new(verifier: Arc<dyn TokenVerifier>, authorize_url: String) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            verifier,
            authorize_url,
            state,
            sign_ins_requested: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.state.borrow().clone()
    }

    /// Initiates the redirect sign-in flow, returning the authorize URL the
    /// web shell should navigate to. The navigation itself (away and back)
    /// happens outside this process's control flow; completion is observed
    /// through the watch channel.
    pub fn begin_sign_in(&self) -> &str {
        self.sign_ins_requested.fetch_add(1, Ordering::Relaxed);
        debug!(url = %self.authorize_url, "initiating redirect sign-in");
        &self.authorize_url
    }

    /// How many times a redirect sign-in has been initiated.
    pub fn sign_ins_requested(&self) -> u64 {
        self.sign_ins_requested.load(Ordering::Relaxed)
    }

    /// Post-redirect entry point: verifies the ID token the provider handed
    /// back and publishes the new identity. A token that fails verification
    /// leaves the state signed out; the failure surfaces only through the
    /// provider's own error channel, which this adapter does not observe.
    pub async fn complete_sign_in(&self, id_token: &str) -> Option<Identity> {
        let claims = self.verifier.verify(id_token).await?;
        let identity = Identity {
            user_id: claims.sub,
            email: claims.email,
        };
        self.state.send_replace(Some(identity.clone()));
        Some(identity)
    }
}

/// Observer registration over the provider's state channel.
pub struct AuthController {
    provider: Arc<RedirectIdentityProvider>,
}

impl AuthController {
    pub fn new(provider: Arc<RedirectIdentityProvider>) -> Self {
        Self { provider }
    }

    /// Registers an observer called with the current identity whenever the
    /// signed-in identity changes. This only observes signed-in states: when
    /// the provider reports no identity, the observer is not called and a
    /// redirect sign-in is silently initiated instead. There is no
    /// unsubscribe; the task lives until the provider is dropped.
    pub fn on_signed_in_identity_changed<F>(&self, mut observer: F) -> JoinHandle<()>
    where
        F: FnMut(Identity) + Send + 'static,
    {
        let mut rx = self.provider.subscribe();
        let provider = Arc::clone(&self.provider);
        tokio::spawn(async move {
            loop {
                let current = rx.borrow_and_update().clone();
                match current {
                    Some(identity) => observer(identity),
                    None => {
                        provider.begin_sign_in();
                    }
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}

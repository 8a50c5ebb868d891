//! Actor kinds and bootstrap
//!
//! An actor is one virtual user. Its kind implements [`Actor`]: a bootstrap
//! that establishes credentials and seeds caches, and a shared action table.
//! Bootstrap failure is fatal to that actor only.

use std::time::Duration;

use async_trait::async_trait;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::session::{MissingAccount, Roster};

use super::action::ActionSet;
use super::metrics::Recorder;

/// Deterministic per-actor RNG, seeded from the run seed and the actor slot
pub type ActorRng = ChaCha8Rng;

/// Why an actor never came online
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("login failed for {username}: {source}")]
    Login {
        username: String,
        #[source]
        source: ApiError,
    },
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    MissingAccount(#[from] MissingAccount),
}

impl BootstrapError {
    /// Attach the username to a failed credential exchange
    pub fn login(username: &str, source: ApiError) -> Self {
        Self::Login {
            username: username.to_string(),
            source,
        }
    }
}

/// Everything an actor needs to come online
#[derive(Clone)]
pub struct BootstrapContext {
    target_url: String,
    request_timeout: Duration,
    roster: Roster,
    recorder: Recorder,
    slot: usize,
    seed: u64,
}

impl BootstrapContext {
    pub fn new(
        target_url: String,
        request_timeout: Duration,
        roster: Roster,
        recorder: Recorder,
        slot: usize,
        seed: u64,
    ) -> Self {
        Self {
            target_url,
            request_timeout,
            roster,
            recorder,
            slot,
            seed,
        }
    }

    /// A fresh client with its own cookie jar, bound to this run's recorder
    pub fn client(&self) -> Result<ApiClient, ApiError> {
        ApiClient::new(&self.target_url, self.request_timeout, self.recorder.clone())
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// This actor's private RNG
    pub fn rng(&self) -> ActorRng {
        ActorRng::seed_from_u64(self.seed)
    }

    /// Launch index within the run, unique across kinds
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// One kind of virtual user
#[async_trait]
pub trait Actor: Send + Sized + 'static {
    /// Kind name used for population wiring, metrics, and logs
    const KIND: &'static str;

    /// Establish credentials and seed caches. An error aborts this actor
    /// only; the rest of the run continues.
    async fn bootstrap(ctx: &BootstrapContext) -> Result<Self, BootstrapError>;

    /// The kind's action table, built once and shared across its actors
    fn actions() -> ActionSet<Self>;
}

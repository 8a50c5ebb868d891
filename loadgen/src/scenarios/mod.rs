//! Actor kinds
//!
//! One module per surface of the target platform. Each kind bundles a
//! bootstrap (who logs in, what gets cached) and a weighted action table
//! over that surface's endpoints.

pub mod alerts;
pub mod anonymous;
pub mod boardgames;
pub mod events;
pub mod forums;
pub mod karaoke;
pub mod profiles;
pub mod seamail;
pub mod twarrts;

use rand::Rng;

use crate::api::ApiClient;
use crate::config::Account;
use crate::harness::{BootstrapError, Scenario};
use crate::session::UserSession;

/// Register every actor kind on a scenario
pub fn install(scenario: Scenario) -> Scenario {
    scenario
        .register::<anonymous::LoggedOutBrowser>()
        .register::<twarrts::TwarrtApiActor>()
        .register::<twarrts::TwarrtWebActor>()
        .register::<forums::ForumApiActor>()
        .register::<forums::ForumWebActor>()
        .register::<seamail::SeamailApiActor>()
        .register::<seamail::SeamailWebActor>()
        .register::<events::EventsApiActor>()
        .register::<events::EventsWebActor>()
        .register::<boardgames::BoardgamesApiActor>()
        .register::<boardgames::BoardgamesWebActor>()
        .register::<karaoke::KaraokeApiActor>()
        .register::<karaoke::KaraokeWebActor>()
        .register::<alerts::NotificationsActor>()
        .register::<profiles::ProfileApiActor>()
}

/// Token login with the username attached to any failure
pub(crate) async fn login(
    client: &ApiClient,
    account: &Account,
) -> Result<UserSession, BootstrapError> {
    client
        .login_token(account)
        .await
        .map_err(|err| BootstrapError::login(&account.username, err))
}

/// Small numeric tag that keeps generated titles and posts distinct
pub(crate) fn stamp<R: Rng>(rng: &mut R) -> u32 {
    rng.random_range(0..1_000_000)
}

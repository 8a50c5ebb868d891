//! Run configuration
//!
//! Configuration is loaded from environment variables; unset or unparseable
//! values fall back to the defaults below.

use std::env;
use std::time::Duration;

use rand::Rng;

/// Main run configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the target platform
    pub target_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Base RNG seed; each actor derives its own from seed + slot
    pub seed: Option<u64>,
    /// Optional path for the JSON copy of the final report
    pub report_json: Option<String>,

    /// Test accounts, in role order (first, second, third, ...)
    pub accounts: Vec<Account>,

    /// Pacing configuration
    pub pacing: PacingConfig,

    /// Population configuration
    pub population: PopulationConfig,
}

/// One test account on the target platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub password: String,
}

/// Pacing-related configuration
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// Minimum inter-action wait
    pub wait_min: Duration,
    /// Maximum inter-action wait
    pub wait_max: Duration,
    /// Window over which actor launches are staggered
    pub ramp_up: Duration,
    /// Window over which stop signals are staggered
    pub ramp_down: Duration,
    /// Time bound for the run; `None` runs until stopped
    pub run_for: Option<Duration>,
    /// Count bound per actor; `None` is unbounded
    pub actions_per_actor: Option<u64>,
}

/// Population-related configuration
#[derive(Debug, Clone)]
pub struct PopulationConfig {
    /// Total target population when no per-kind list is given
    pub total: usize,
    /// Per-kind overrides; kinds absent from the list get zero
    pub per_kind: Option<Vec<(String, usize)>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: "http://127.0.0.1:8081".to_string(),
            request_timeout: Duration::from_secs(30),
            seed: None,
            report_json: None,
            accounts: default_accounts(),
            pacing: PacingConfig::default(),
            population: PopulationConfig::default(),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            wait_min: Duration::from_millis(1000),
            wait_max: Duration::from_millis(5000),
            ramp_up: Duration::from_secs(10),
            ramp_down: Duration::ZERO,
            run_for: Some(Duration::from_secs(60)),
            actions_per_actor: None,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            total: 16,
            per_kind: None,
        }
    }
}

fn default_accounts() -> Vec<Account> {
    ["sam", "heidi", "james"]
        .iter()
        .map(|name| Account {
            username: name.to_string(),
            password: "password".to_string(),
        })
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("TARGET_URL")
            && !url.is_empty()
        {
            config.target_url = url;
        }
        if let Ok(val) = env::var("REQUEST_TIMEOUT_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Ok(val) = env::var("SEED")
            && let Ok(seed) = val.parse()
        {
            config.seed = Some(seed);
        }
        if let Ok(path) = env::var("REPORT_JSON")
            && !path.is_empty()
        {
            config.report_json = Some(path);
        }
        if let Ok(val) = env::var("ACCOUNTS") {
            let accounts = parse_accounts(&val);
            if accounts.is_empty() {
                tracing::warn!("ACCOUNTS parsed to an empty list, keeping defaults");
            } else {
                config.accounts = accounts;
            }
        }

        // Pacing
        if let Ok(val) = env::var("WAIT_MIN_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.pacing.wait_min = Duration::from_millis(ms);
        }
        if let Ok(val) = env::var("WAIT_MAX_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.pacing.wait_max = Duration::from_millis(ms);
        }
        if config.pacing.wait_max < config.pacing.wait_min {
            config.pacing.wait_max = config.pacing.wait_min;
        }
        if let Ok(val) = env::var("RAMP_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            config.pacing.ramp_up = Duration::from_secs(secs);
        }
        if let Ok(val) = env::var("RAMP_DOWN_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            config.pacing.ramp_down = Duration::from_secs(secs);
        }
        if let Ok(val) = env::var("RUN_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            config.pacing.run_for = if secs == 0 {
                None
            } else {
                Some(Duration::from_secs(secs))
            };
        }
        if let Ok(val) = env::var("ACTIONS_PER_ACTOR")
            && let Ok(count) = val.parse()
        {
            config.pacing.actions_per_actor = Some(count);
        }

        // Population
        if let Ok(val) = env::var("ACTORS")
            && let Ok(total) = val.parse()
        {
            config.population.total = total;
        }
        if let Ok(val) = env::var("POPULATION") {
            let per_kind = parse_population(&val);
            if per_kind.is_empty() {
                tracing::warn!("POPULATION parsed to an empty list, ignoring");
            } else {
                config.population.per_kind = Some(per_kind);
            }
        }

        config
    }
}

impl PacingConfig {
    /// Draw one inter-action wait from the configured interval
    pub fn sample_wait<R: Rng>(&self, rng: &mut R) -> Duration {
        let min = self.wait_min.as_millis() as u64;
        let max = self.wait_max.as_millis() as u64;
        if max <= min {
            return self.wait_min;
        }
        Duration::from_millis(rng.random_range(min..=max))
    }
}

/// Parse `user:password,user:password,...`, skipping malformed entries
fn parse_accounts(raw: &str) -> Vec<Account> {
    raw.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            let (username, password) = entry.split_once(':')?;
            if username.is_empty() || password.is_empty() {
                tracing::warn!(entry, "skipping malformed account entry");
                return None;
            }
            Some(Account {
                username: username.to_string(),
                password: password.to_string(),
            })
        })
        .collect()
}

/// Parse `kind=count,kind=count,...`, skipping malformed entries
fn parse_population(raw: &str) -> Vec<(String, usize)> {
    raw.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            let (kind, count) = entry.split_once('=')?;
            match count.trim().parse() {
                Ok(count) if !kind.is_empty() => Some((kind.trim().to_string(), count)),
                _ => {
                    tracing::warn!(entry, "skipping malformed population entry");
                    None
                }
            }
        })
        .collect()
}

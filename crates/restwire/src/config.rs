//! Configuration for the execution engine

use std::time::Duration;

/// Default `User-Agent` sent with every exchange.
pub const DEFAULT_USER_AGENT: &str = concat!("restwire/", env!("CARGO_PKG_VERSION"));

/// Configuration for the [`ExecutionEngine`](crate::http::ExecutionEngine).
///
/// Timeouts apply to a single exchange. Retry, throttle and lock settings
/// apply per credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Time allowed to establish a connection
    pub connect_timeout: Duration,

    /// Overall deadline for one exchange
    pub timeout: Duration,

    /// Total number of attempts for one exchange, including the first
    pub max_attempts: u32,

    /// Backoff step; the n-th retry waits `n × step` (the first retry is immediate)
    pub retry_backoff_step: Duration,

    /// Minimum spacing between mutation sends under one credential
    pub mutation_interval: Duration,

    /// Upper bound on waiting for a credential lock
    pub lock_timeout: Duration,

    /// `User-Agent` header value
    pub user_agent: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
            max_attempts: 5,
            retry_backoff_step: Duration::from_secs(1),
            mutation_interval: Duration::from_secs(1),
            lock_timeout: Duration::from_secs(600),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl EngineConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    /// This will look for:
    /// - `RESTWIRE_TIMEOUT` for the exchange timeout (in seconds)
    /// - `RESTWIRE_CONNECT_TIMEOUT` for the connect timeout (in seconds)
    /// - `RESTWIRE_MAX_ATTEMPTS` for the attempt bound
    /// - `RESTWIRE_RETRY_STEP_MS` for the backoff step (in milliseconds)
    /// - `RESTWIRE_MUTATION_INTERVAL_MS` for the mutation spacing (in milliseconds)
    /// - `RESTWIRE_USER_AGENT` for the `User-Agent` header
    ///
    /// Unparsable values are ignored and the default is kept.
    #[cfg(feature = "env")]
    pub fn from_env() -> Self {
        use std::env;

        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Some(secs) = env_parse::<u64>("RESTWIRE_TIMEOUT") {
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = env_parse::<u64>("RESTWIRE_CONNECT_TIMEOUT") {
            config.connect_timeout = Duration::from_secs(secs);
        }

        if let Some(attempts) = env_parse::<u32>("RESTWIRE_MAX_ATTEMPTS") {
            config.max_attempts = attempts.max(1);
        }

        if let Some(ms) = env_parse::<u64>("RESTWIRE_RETRY_STEP_MS") {
            config.retry_backoff_step = Duration::from_millis(ms);
        }

        if let Some(ms) = env_parse::<u64>("RESTWIRE_MUTATION_INTERVAL_MS") {
            config.mutation_interval = Duration::from_millis(ms);
        }

        if let Ok(agent) = env::var("RESTWIRE_USER_AGENT")
            && !agent.trim().is_empty()
        {
            config.user_agent = agent;
        }

        config
    }
}

#[cfg(feature = "env")]
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the overall exchange timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the total number of attempts. Values below 1 are raised to 1.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts.max(1);
        self
    }

    /// Set the linear backoff step.
    pub fn retry_backoff_step(mut self, step: Duration) -> Self {
        self.config.retry_backoff_step = step;
        self
    }

    /// Set the minimum spacing between mutations under one credential.
    pub fn mutation_interval(mut self, interval: Duration) -> Self {
        self.config.mutation_interval = interval;
        self
    }

    /// Set the credential lock timeout.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.lock_timeout = timeout;
        self
    }

    /// Set the `User-Agent` header value.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Finish building.
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

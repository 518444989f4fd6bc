use serde::Deserialize;

const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const MAX_CHANNEL_CAPACITY: usize = 1 << 20;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub stripe: StripeConfig,
    pub events: EventsConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    pub secret_key: String,
    pub endpoint_secret: String,
    pub success_url: String,
    pub cancel_url: String,
    pub api_base: String,
    /// Maximum age of a webhook signature timestamp, in seconds. Zero disables the check.
    pub webhook_tolerance_secs: u64,
}

/// Where `payment.succeeded` notifications go once a webhook is verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSink {
    Log,
    Broadcast,
    Http,
}

impl EventSink {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSink::Log => "log",
            EventSink::Broadcast => "broadcast",
            EventSink::Http => "http",
        }
    }
}

impl std::str::FromStr for EventSink {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "log" => Ok(EventSink::Log),
            "broadcast" => Ok(EventSink::Broadcast),
            "http" => Ok(EventSink::Http),
            other => Err(format!(
                "unknown event sink '{}', expected one of: log, broadcast, http",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    pub sink: EventSink,
    pub bus_url: Option<String>,
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let source = config::Config::builder()
            .add_source(config::Environment::default().separator("_").try_parsing(true))
            .build()?;

        Self::from_source(&source)
    }

    /// Builds the typed configuration from an already-assembled `config::Config`.
    ///
    /// Keys follow the environment naming with `_` turned into `.`,
    /// e.g. `STRIPE_SECRET_KEY` becomes `stripe.secret.key`.
    pub fn from_source(config: &config::Config) -> Result<Self, config::ConfigError> {
        let sink = match config.get_string("events.sink") {
            Ok(raw) => raw
                .parse::<EventSink>()
                .map_err(config::ConfigError::Message)?,
            Err(_) => EventSink::Log,
        };

        let bus_url = config.get_string("events.bus.url").ok();
        if sink == EventSink::Http && bus_url.is_none() {
            return Err(config::ConfigError::Message(
                "EVENTS_BUS_URL is required when EVENTS_SINK=http".to_string(),
            ));
        }

        let channel_capacity: usize = int_or(config, "events.channel.capacity", 1000)?;
        if channel_capacity == 0 || channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(config::ConfigError::Message(format!(
                "EVENTS_CHANNEL_CAPACITY must be between 1 and {}, got {}",
                MAX_CHANNEL_CAPACITY, channel_capacity
            )));
        }

        // Manual construction due to environment variable naming
        Ok(Config {
            server: ServerConfig {
                host: config.get_string("host").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: int_or(config, "port", 3003)?,
            },
            stripe: StripeConfig {
                secret_key: config.get_string("stripe.secret.key")?,
                endpoint_secret: config.get_string("stripe.endpoint.secret")?,
                success_url: config.get_string("stripe.success.url")?,
                cancel_url: config.get_string("stripe.cancel.url")?,
                api_base: config
                    .get_string("stripe.api.base")
                    .unwrap_or_else(|_| DEFAULT_STRIPE_API_BASE.to_string()),
                webhook_tolerance_secs: int_or(config, "stripe.webhook.tolerance", 300)?,
            },
            events: EventsConfig {
                sink,
                bus_url,
                channel_capacity,
            },
            rate_limit: RateLimitConfig {
                requests_per_second: int_or(config, "rate.limit.requests.per.second", 50)?,
                burst_size: int_or(config, "rate.limit.burst.size", 100)?,
            },
        })
    }
}

/// Reads an integer key, falling back to `default` only when the key is absent.
fn int_or<T>(config: &config::Config, key: &str, default: T) -> Result<T, config::ConfigError>
where
    T: TryFrom<i64>,
{
    match config.get_int(key) {
        Ok(raw) => T::try_from(raw).map_err(|_| {
            config::ConfigError::Message(format!("{} is out of range: {}", key, raw))
        }),
        Err(config::ConfigError::NotFound(_)) => Ok(default),
        Err(e) => Err(e),
    }
}

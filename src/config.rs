use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_RATE_PER_KM: f64 = 2.5;
const DEFAULT_MINIMUM_FARE: f64 = 50.0;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub pricing: PricingPolicy,
    pub directions: Option<DirectionsConfig>,
}

#[derive(Clone, Debug)]
pub struct DirectionsConfig {
    pub api_base: String,
    pub api_key: String,
}

/// Flat per-kilometre pricing used to cap what a driver may charge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricingPolicy {
    pub rate_per_km: f64,
    pub minimum_fare: f64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            rate_per_km: DEFAULT_RATE_PER_KM,
            minimum_fare: DEFAULT_MINIMUM_FARE,
        }
    }
}

impl PricingPolicy {
    pub fn ceiling(&self, distance_km: f64) -> f64 {
        (distance_km.max(0.0) * self.rate_per_km)
            .max(self.minimum_fare)
            .ceil()
    }
}

impl Config {
    /// Reads the configuration from the environment. `.env` is expected to be
    /// loaded by the caller.
    pub fn from_env() -> Result<Self, Error> {
        let addr = parse_var("LYVO_ADDR")?
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));

        let database_url = optional_var("DATABASE_URL");

        let max_connections =
            parse_var("DATABASE_MAX_CONNECTIONS")?.unwrap_or(DEFAULT_MAX_CONNECTIONS);

        let pricing = PricingPolicy {
            rate_per_km: parse_var("LYVO_RATE_PER_KM")?.unwrap_or(DEFAULT_RATE_PER_KM),
            minimum_fare: parse_var("LYVO_MINIMUM_FARE")?.unwrap_or(DEFAULT_MINIMUM_FARE),
        };

        let directions = match (
            optional_var("DIRECTIONS_API_BASE"),
            optional_var("DIRECTIONS_API_KEY"),
        ) {
            (Some(api_base), Some(api_key)) => Some(DirectionsConfig { api_base, api_key }),
            _ => None,
        };

        Ok(Self {
            addr,
            database_url,
            max_connections,
            pricing,
            directions,
        })
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>, Error> {
    match optional_var(key) {
        Some(value) => value.trim().parse().map(Some).map_err(|_| {
            tracing::error!("invalid value for {}: {}", key, value);
            Error::validation_error(format!("invalid value for {}", key))
        }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_is_rate_times_distance_rounded_up() {
        let pricing = PricingPolicy {
            rate_per_km: 2.5,
            minimum_fare: 50.0,
        };

        assert_eq!(pricing.ceiling(100.0), 250.0);
        assert_eq!(pricing.ceiling(100.3), 251.0);
    }

    #[test]
    fn ceiling_never_drops_below_minimum_fare() {
        let pricing = PricingPolicy::default();

        assert_eq!(pricing.ceiling(1.0), DEFAULT_MINIMUM_FARE);
        assert_eq!(pricing.ceiling(-10.0), DEFAULT_MINIMUM_FARE);
    }
}

//! Run configuration, read from the environment.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Days, NaiveTime, TimeDelta, Utc, Weekday};

use crate::fetch::RetryPolicy;

/// `true` enables the (paid) distance provider. Anything else, or unset,
/// means every distance is computed as the crow flies.
pub const USE_DISTANCE_PROVIDER_VAR: &str = "CARBONE_USE_GOOGLE";
/// Optional unix timestamp overriding the computed departure time.
pub const DEPARTURE_TIME_VAR: &str = "CARBONE_DEPARTURE_TIME";
pub const DISTANCE_API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const EMISSIONS_API_KEY_VAR: &str = "ADEME_API_KEY";

const DEPARTURE_HOUR_UTC: i64 = 13;

#[derive(Debug, Clone)]
pub struct Config {
    pub use_distance_provider: bool,
    /// Unix timestamp sent as `departure_time` to the distance provider.
    pub departure_time: i64,
    /// Names of the environment variables holding the API keys. They are
    /// read on every request, never stored here.
    pub distance_key_var: String,
    pub emissions_key_var: String,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_distance_provider: false,
            departure_time: next_departure_timestamp(Utc::now()),
            distance_key_var: DISTANCE_API_KEY_VAR.to_string(),
            emissions_key_var: EMISSIONS_API_KEY_VAR.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let use_distance_provider = std::env::var(USE_DISTANCE_PROVIDER_VAR)
            .map(|v| v == "true")
            .unwrap_or(false);

        let departure_time = match std::env::var(DEPARTURE_TIME_VAR) {
            Ok(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("{DEPARTURE_TIME_VAR} must be a unix timestamp, got '{raw}'"))?,
            Err(_) => next_departure_timestamp(Utc::now()),
        };

        Ok(Self {
            use_distance_provider,
            departure_time,
            ..Self::default()
        })
    }
}

/// Next Friday 13:00 UTC strictly after `now`.
///
/// The distance provider only accepts departure times from a few days in the
/// past onwards, so the time is derived from the run date. A fixed weekday
/// and hour keep transit timetables comparable from one run to the next.
pub fn next_departure_timestamp(now: DateTime<Utc>) -> i64 {
    let today = now.date_naive();
    let days_ahead = (7 + Weekday::Fri.num_days_from_monday()
        - today.weekday().num_days_from_monday())
        % 7;

    let candidate = (today + Days::new(days_ahead.into()))
        .and_time(NaiveTime::MIN)
        .and_utc()
        + TimeDelta::hours(DEPARTURE_HOUR_UTC);

    if candidate > now {
        candidate.timestamp()
    } else {
        (candidate + Days::new(7)).timestamp()
    }
}

//! Segment distance, from the distance matrix provider or as the crow flies.

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::CarbonError;
use crate::fetch::{FetchError, HttpClient, ProviderRequest, RetryingClient, UrlParam};
use crate::outing::{Place, Segment};
use crate::transport::{DistanceStrategy, ProviderMode};

pub const DISTANCE_HOST: &str = "maps.googleapis.com";
pub const DISTANCE_PATH: &str = "/maps/api/distancematrix/json";

const DISTANCE_POINTER: &str = "/rows/0/elements/0/distance/value";
const DISTANCE_FIELD: &str = "rows[0].elements[0].distance.value";

pub struct DistanceResolver<C> {
    /// `None` when the provider is disabled: every segment is then geodesic.
    provider: Option<RetryingClient<UrlParam<C>>>,
    departure_time: i64,
}

impl<C: HttpClient> DistanceResolver<C> {
    pub fn new(client: C, config: &Config) -> Self {
        let provider = config.use_distance_provider.then(|| {
            RetryingClient::new(
                UrlParam::new(client, "key", config.distance_key_var.as_str()),
                config.retry,
            )
        });
        Self {
            provider,
            departure_time: config.departure_time,
        }
    }

    pub fn uses_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// One-way distance of `segment`, in meters.
    ///
    /// # Errors
    ///
    /// [`CarbonError::InvalidCoordinate`] when a geodesic distance cannot be
    /// computed, [`CarbonError::DistanceUnavailable`] when every provider
    /// mode failed.
    #[tracing::instrument(
        skip(self, segment),
        fields(transport = %segment.transport, from = %segment.departure.name, to = %segment.arrival.name)
    )]
    pub async fn resolve(&self, segment: &Segment) -> Result<f64, CarbonError> {
        match (&self.provider, segment.transport.distance_strategy()) {
            (Some(provider), DistanceStrategy::ProviderChain) => {
                self.resolve_with_provider(provider, segment).await
            }
            _ => geodesic_distance(segment),
        }
    }

    async fn resolve_with_provider(
        &self,
        provider: &RetryingClient<UrlParam<C>>,
        segment: &Segment,
    ) -> Result<f64, CarbonError> {
        let modes = segment.transport.provider_modes()?;
        let mut last_error = None;

        for &mode in modes {
            let request = self.request(segment, mode);
            match provider.get_json(&request).await.and_then(|body| distance_value(&body)) {
                Ok(meters) => {
                    debug!(mode = mode.as_str(), meters, "Distance resolved by provider");
                    return Ok(meters);
                }
                Err(err) => {
                    warn!(mode = mode.as_str(), error = %err, "Distance provider mode failed");
                    last_error = Some(err);
                }
            }
        }

        // Calls without a result are not billed by the provider, so a failed
        // chain costs nothing beyond the time spent.
        error!(
            origins = %segment.departure.geoloc,
            destinations = %segment.arrival.geoloc,
            modes = ?modes.iter().map(|m| m.as_str()).collect::<Vec<_>>(),
            "Distance unavailable from every provider mode"
        );
        Err(CarbonError::DistanceUnavailable {
            source: last_error.unwrap_or(FetchError::UnexpectedBody {
                path: DISTANCE_FIELD,
            }),
        })
    }

    /// A departure time doubles the price of road queries, so it is only
    /// sent for transit, or when an endpoint is in the Alps where winter
    /// road closures depend on the date.
    fn request(&self, segment: &Segment, mode: ProviderMode) -> ProviderRequest {
        let mut request = ProviderRequest::new(DISTANCE_HOST, DISTANCE_PATH)
            .param("mode", mode.as_str())
            .param("destinations", &segment.arrival.geoloc)
            .param("origins", &segment.departure.geoloc);

        if mode != ProviderMode::Driving || in_alps(&segment.departure) || in_alps(&segment.arrival)
        {
            request = request.param("departure_time", self.departure_time);
        }
        request
    }
}

/// Great-circle distance between the two ends of `segment`, in meters.
pub fn geodesic_distance(segment: &Segment) -> Result<f64, CarbonError> {
    let from = segment.departure.coordinate()?;
    let to = segment.arrival.coordinate()?;
    Ok(from.distance_to(&to))
}

fn in_alps(place: &Place) -> bool {
    match place.coordinate() {
        Ok(coordinate) => coordinate.is_in_alps(),
        Err(err) => {
            warn!(place = %place.name, error = %err, "Cannot locate place, assuming outside the Alps");
            false
        }
    }
}

fn distance_value(body: &Value) -> Result<f64, FetchError> {
    body.pointer(DISTANCE_POINTER)
        .and_then(Value::as_f64)
        .ok_or(FetchError::UnexpectedBody {
            path: DISTANCE_FIELD,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RetryPolicy;
    use crate::fetch::mock::{MockClient, MockReply};
    use crate::geo::ORIGIN_GEOLOC;
    use crate::transport::TransportType;
    use serde_json::json;
    use std::sync::Once;
    use std::time::Duration;

    const KEY_VAR: &str = "OUTING_CARBON_TEST_DISTANCE_KEY";
    const DEPARTURE: i64 = 1_743_771_600;
    const LYON: &str = "45.764, 4.8357";
    const CHAMONIX: &str = "45.9237, 6.8694";

    fn config(use_distance_provider: bool) -> Config {
        static KEY: Once = Once::new();
        KEY.call_once(|| unsafe { std::env::set_var(KEY_VAR, "distance-key") });
        Config {
            use_distance_provider,
            departure_time: DEPARTURE,
            distance_key_var: KEY_VAR.to_string(),
            emissions_key_var: "OUTING_CARBON_TEST_UNUSED".to_string(),
            retry: RetryPolicy {
                max_attempts: 3,
                backoff: Duration::ZERO,
            },
        }
    }

    fn segment(transport: TransportType, to: &str) -> Segment {
        Segment::new(
            Place::new("Paris", ORIGIN_GEOLOC),
            Place::new("Destination", to),
            transport,
            false,
        )
    }

    fn matrix(meters: u64) -> MockReply {
        MockReply::Json(json!({
            "rows": [{ "elements": [{ "distance": { "text": "", "value": meters }, "status": "OK" }] }],
            "status": "OK"
        }))
    }

    fn no_route() -> MockReply {
        MockReply::Json(json!({
            "rows": [{ "elements": [{ "status": "ZERO_RESULTS" }] }],
            "status": "OK"
        }))
    }

    #[tokio::test]
    async fn test_disabled_provider_is_geodesic_for_every_type() {
        let mock = MockClient::new();
        let resolver = DistanceResolver::new(mock.clone(), &config(false));

        let meters = resolver.resolve(&segment(TransportType::TrainTgv, LYON)).await.unwrap();

        assert!(!resolver.uses_provider());
        assert!((meters - 392_000.0).abs() < 10_000.0, "{meters}");
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_plane_is_geodesic_even_with_provider() {
        let mock = MockClient::new();
        mock.always(DISTANCE_HOST, matrix(1));
        let resolver = DistanceResolver::new(mock.clone(), &config(true));

        let meters = resolver.resolve(&segment(TransportType::Plane, LYON)).await.unwrap();

        assert!(meters > 300_000.0);
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_train_uses_transit_with_departure_time() {
        let mock = MockClient::new();
        mock.push(DISTANCE_HOST, matrix(465_123));
        let resolver = DistanceResolver::new(mock.clone(), &config(true));

        let meters = resolver.resolve(&segment(TransportType::TrainTer, LYON)).await.unwrap();

        assert_eq!(meters, 465_123.0);
        let seen = mock.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].url.path(), DISTANCE_PATH);
        assert_eq!(seen[0].query("mode").as_deref(), Some("transit"));
        assert_eq!(seen[0].query("origins").as_deref(), Some(ORIGIN_GEOLOC));
        assert_eq!(seen[0].query("destinations").as_deref(), Some(LYON));
        assert_eq!(seen[0].query("departure_time").as_deref(), Some("1743771600"));
        assert_eq!(seen[0].query("key").as_deref(), Some("distance-key"));
    }

    #[tokio::test]
    async fn test_bus_falls_back_to_road_without_departure_time() {
        let mock = MockClient::new();
        mock.push(DISTANCE_HOST, no_route());
        mock.push(DISTANCE_HOST, matrix(470_000));
        let resolver = DistanceResolver::new(mock.clone(), &config(true));

        let meters = resolver.resolve(&segment(TransportType::Bus, LYON)).await.unwrap();

        assert_eq!(meters, 470_000.0);
        let seen = mock.requests();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].query("mode").as_deref(), Some("transit"));
        assert_eq!(seen[1].query("mode").as_deref(), Some("driving"));
        assert_eq!(seen[1].query("departure_time"), None);
    }

    #[tokio::test]
    async fn test_road_into_the_alps_sends_departure_time() {
        let mock = MockClient::new();
        mock.push(DISTANCE_HOST, matrix(610_000));
        let resolver = DistanceResolver::new(mock.clone(), &config(true));

        resolver.resolve(&segment(TransportType::CarPool, CHAMONIX)).await.unwrap();

        let seen = mock.requests();
        assert_eq!(seen[0].query("mode").as_deref(), Some("driving"));
        assert_eq!(seen[0].query("departure_time").as_deref(), Some("1743771600"));
    }

    #[tokio::test]
    async fn test_unparsable_endpoint_counts_as_outside_the_alps() {
        let mock = MockClient::new();
        mock.push(DISTANCE_HOST, matrix(1_000));
        let resolver = DistanceResolver::new(mock.clone(), &config(true));

        resolver
            .resolve(&segment(TransportType::Taxi, "Gare de Lyon, Paris"))
            .await
            .unwrap();

        assert_eq!(mock.requests()[0].query("departure_time"), None);
    }

    #[tokio::test]
    async fn test_every_mode_failing_is_distance_unavailable() {
        let mock = MockClient::new();
        mock.always(DISTANCE_HOST, MockReply::status(500, "down"));
        let resolver = DistanceResolver::new(mock.clone(), &config(true));

        let err = resolver.resolve(&segment(TransportType::CityBus, LYON)).await.unwrap_err();

        // Two modes, three attempts each.
        assert_eq!(mock.requests().len(), 6);
        match err {
            CarbonError::DistanceUnavailable { source } => {
                assert!(matches!(source, FetchError::RequestFailed { attempts: 3, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_geodesic_rejects_bad_coordinate() {
        let mock = MockClient::new();
        let resolver = DistanceResolver::new(mock, &config(true));

        let err = resolver
            .resolve(&segment(TransportType::Ferry, "somewhere"))
            .await
            .unwrap_err();

        assert!(matches!(err, CarbonError::InvalidCoordinate(ref raw) if raw == "somewhere"));
    }
}

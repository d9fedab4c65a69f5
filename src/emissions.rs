//! CO2-equivalent emissions of a segment, from the emissions provider.

use serde_json::Value;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::CarbonError;
use crate::fetch::{ApiKey, FetchError, HttpClient, ProviderRequest, RetryingClient};
use crate::transport::TransportType;

pub const EMISSIONS_HOST: &str = "impactco2.fr";
pub const EMISSIONS_PATH: &str = "/api/v1/transport";

const VALUE_POINTER: &str = "/data/0/value";
const VALUE_FIELD: &str = "data[0].value";

pub struct EmissionsResolver<C> {
    provider: RetryingClient<ApiKey<C>>,
}

impl<C: HttpClient> EmissionsResolver<C> {
    /// The provider accepts unauthenticated calls, so a missing key only
    /// produces a warning.
    pub fn new(client: C, config: &Config) -> Self {
        let auth = ApiKey::bearer(client, config.emissions_key_var.as_str()).allow_anonymous();
        Self {
            provider: RetryingClient::new(auth, config.retry),
        }
    }

    /// Kilograms of CO2 equivalent for `distance_meters` travelled by
    /// `transport`, construction of the vehicle included.
    ///
    /// # Errors
    ///
    /// [`CarbonError::NoEmissionsEquivalent`] when the provider has no
    /// model for `transport`, [`CarbonError::EmissionsUnavailable`] when the
    /// call failed or returned no value.
    #[tracing::instrument(skip(self, transport), fields(transport = %transport))]
    pub async fn resolve(
        &self,
        distance_meters: f64,
        transport: TransportType,
    ) -> Result<f64, CarbonError> {
        let code = transport.emissions_code()?;
        let km = (distance_meters / 1000.0).round() as u64;

        let request = ProviderRequest::new(EMISSIONS_HOST, EMISSIONS_PATH)
            .param("km", km)
            .param("displayAll", 0)
            .param("transports", code.id())
            .param("ignoreRadiativeForcing", 0)
            .param("includeConstruction", 1)
            .param("language", "fr");

        let result = self
            .provider
            .get_json(&request)
            .await
            .and_then(|body| emissions_value(&body));

        match result {
            Ok(kg) => {
                debug!(km, code = code.id(), kg, "Emissions resolved");
                Ok(kg)
            }
            Err(err) => {
                error!(km, code = code.id(), error = %err, "Emissions unavailable");
                Err(CarbonError::EmissionsUnavailable { source: err })
            }
        }
    }
}

/// The provider returns one entry per requested transport.
fn emissions_value(body: &Value) -> Result<f64, FetchError> {
    let value = body.pointer(VALUE_POINTER);
    value
        .and_then(Value::as_f64)
        .or_else(|| value.and_then(Value::as_str).and_then(|s| s.parse().ok()))
        .ok_or(FetchError::UnexpectedBody { path: VALUE_FIELD })
}

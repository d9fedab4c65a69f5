//! Transport taxonomy.
//!
//! The input file labels each segment with the club's own transport names.
//! [`TransportType`] is the closed set of those names once normalized, and
//! carries one lookup table per external vocabulary: the distance provider's
//! travel modes and the emissions provider's transport ids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CarbonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportType {
    #[serde(rename = "AUTOBUS")]
    CityBus,
    #[serde(rename = "AUTOCAR")]
    Coach,
    #[serde(rename = "AUTOCAR-CAR-COUCHETTE")]
    SleeperCoach,
    #[serde(rename = "AVION")]
    Plane,
    #[serde(rename = "BATEAU-FERRY")]
    Ferry,
    #[serde(rename = "BATEAU-VEDETTE")]
    FastBoat,
    #[serde(rename = "BUS")]
    Bus,
    #[serde(rename = "COVOITURAGE")]
    CarPool,
    #[serde(rename = "MÉTRO")]
    Metro,
    #[serde(rename = "MINIBUS")]
    Minibus,
    #[serde(rename = "TAXI-VOITURE")]
    Taxi,
    #[serde(rename = "TRAIN-INTERCITÉS")]
    TrainIntercity,
    #[serde(rename = "TRAIN-RER")]
    TrainRer,
    #[serde(rename = "TRAIN-TER")]
    TrainTer,
    #[serde(rename = "TRAIN-TRANSILIEN")]
    TrainTransilien,
    #[serde(rename = "TRAIN-TGV")]
    TrainTgv,
    #[serde(rename = "TRAIN-DE-NUIT")]
    NightTrain,
    #[serde(rename = "TRAMWAY")]
    Tram,
}

/// How the distance of a segment is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceStrategy {
    /// Great-circle distance between the two coordinates.
    DirectGeodesic,
    /// Distance provider, trying each of [`TransportType::provider_modes`].
    ProviderChain,
}

/// Travel modes understood by the distance provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMode {
    Driving,
    Transit,
}

impl ProviderMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderMode::Driving => "driving",
            ProviderMode::Transit => "transit",
        }
    }
}

/// Transport ids of the emissions provider, limited to those the mapping
/// policy uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EmissionsCode {
    Plane = 1,
    Tgv = 2,
    Intercity = 3,
    ThermalCoach = 6,
    ThermalBus = 9,
    Tram = 10,
    Metro = 11,
    RerOrTransilien = 14,
    Ter = 15,
    ThermalCarPool3Passengers = 24,
    ThermalCarPool4Passengers = 25,
}

impl EmissionsCode {
    pub fn id(self) -> u8 {
        self as u8
    }
}

const TRANSIT_ONLY: &[ProviderMode] = &[ProviderMode::Transit];
const TRANSIT_THEN_ROAD: &[ProviderMode] = &[ProviderMode::Transit, ProviderMode::Driving];
const ROAD_ONLY: &[ProviderMode] = &[ProviderMode::Driving];

impl TransportType {
    pub const ALL: [TransportType; 18] = [
        TransportType::CityBus,
        TransportType::Coach,
        TransportType::SleeperCoach,
        TransportType::Plane,
        TransportType::Ferry,
        TransportType::FastBoat,
        TransportType::Bus,
        TransportType::CarPool,
        TransportType::Metro,
        TransportType::Minibus,
        TransportType::Taxi,
        TransportType::TrainIntercity,
        TransportType::TrainRer,
        TransportType::TrainTer,
        TransportType::TrainTransilien,
        TransportType::TrainTgv,
        TransportType::NightTrain,
        TransportType::Tram,
    ];

    /// Canonical identifier, as it appears in normalized input labels.
    pub fn as_str(self) -> &'static str {
        match self {
            TransportType::CityBus => "AUTOBUS",
            TransportType::Coach => "AUTOCAR",
            TransportType::SleeperCoach => "AUTOCAR-CAR-COUCHETTE",
            TransportType::Plane => "AVION",
            TransportType::Ferry => "BATEAU-FERRY",
            TransportType::FastBoat => "BATEAU-VEDETTE",
            TransportType::Bus => "BUS",
            TransportType::CarPool => "COVOITURAGE",
            TransportType::Metro => "MÉTRO",
            TransportType::Minibus => "MINIBUS",
            TransportType::Taxi => "TAXI-VOITURE",
            TransportType::TrainIntercity => "TRAIN-INTERCITÉS",
            TransportType::TrainRer => "TRAIN-RER",
            TransportType::TrainTer => "TRAIN-TER",
            TransportType::TrainTransilien => "TRAIN-TRANSILIEN",
            TransportType::TrainTgv => "TRAIN-TGV",
            TransportType::NightTrain => "TRAIN-DE-NUIT",
            TransportType::Tram => "TRAMWAY",
        }
    }

    /// Parses a free-form label.
    ///
    /// Surrounding whitespace is ignored, letters are upper-cased and every
    /// run of spaces, underscores and hyphens becomes a single hyphen, so
    /// `"Train  tgv"`, `"TRAIN_TGV"` and `"train-TGV"` are all
    /// [`TransportType::TrainTgv`].
    pub fn normalize(raw: &str) -> Result<Self, CarbonError> {
        let mut label = String::with_capacity(raw.len());
        let mut in_separator = false;
        for c in raw.trim().chars() {
            if matches!(c, ' ' | '_' | '-') {
                if !in_separator {
                    label.push('-');
                    in_separator = true;
                }
            } else {
                label.extend(c.to_uppercase());
                in_separator = false;
            }
        }

        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == label)
            .ok_or_else(|| CarbonError::UnknownTransportType(raw.to_string()))
    }

    /// The distance provider is unreliable for planes and boats: ferries show
    /// up under arbitrary modes and flights are measured as the crow flies.
    pub fn distance_strategy(self) -> DistanceStrategy {
        match self {
            TransportType::Plane | TransportType::Ferry | TransportType::FastBoat => {
                DistanceStrategy::DirectGeodesic
            }
            _ => DistanceStrategy::ProviderChain,
        }
    }

    /// Distance provider modes to try, in order.
    ///
    /// Bus lines are often missing from the provider's transit graph, hence
    /// the road fallback.
    ///
    /// # Errors
    ///
    /// [`CarbonError::UnsupportedForProvider`] for types whose strategy is
    /// [`DistanceStrategy::DirectGeodesic`].
    pub fn provider_modes(self) -> Result<&'static [ProviderMode], CarbonError> {
        match self {
            TransportType::Metro
            | TransportType::Tram
            | TransportType::TrainIntercity
            | TransportType::TrainRer
            | TransportType::TrainTer
            | TransportType::TrainTransilien
            | TransportType::TrainTgv
            | TransportType::NightTrain => Ok(TRANSIT_ONLY),
            TransportType::Bus | TransportType::CityBus => Ok(TRANSIT_THEN_ROAD),
            TransportType::Plane | TransportType::Ferry | TransportType::FastBoat => {
                Err(CarbonError::UnsupportedForProvider(self))
            }
            TransportType::Coach
            | TransportType::SleeperCoach
            | TransportType::CarPool
            | TransportType::Minibus
            | TransportType::Taxi => Ok(ROAD_ONLY),
        }
    }

    /// Emissions provider id for this type.
    ///
    /// Types without a direct equivalent are substituted:
    /// - sleeper coaches are counted as regular thermal coaches (their fleet
    ///   is older, but the provider has no dedicated factor);
    /// - night trains are counted as intercity trains;
    /// - minibuses and taxis as a thermal car carrying four passengers;
    /// - car pools as a thermal car carrying three.
    ///
    /// # Errors
    ///
    /// [`CarbonError::NoEmissionsEquivalent`] for boats, which the provider
    /// does not model.
    pub fn emissions_code(self) -> Result<EmissionsCode, CarbonError> {
        let code = match self {
            TransportType::Coach | TransportType::SleeperCoach => EmissionsCode::ThermalCoach,
            TransportType::Plane => EmissionsCode::Plane,
            TransportType::Bus | TransportType::CityBus => EmissionsCode::ThermalBus,
            TransportType::CarPool => EmissionsCode::ThermalCarPool3Passengers,
            TransportType::Metro => EmissionsCode::Metro,
            TransportType::Minibus | TransportType::Taxi => {
                EmissionsCode::ThermalCarPool4Passengers
            }
            TransportType::TrainIntercity | TransportType::NightTrain => EmissionsCode::Intercity,
            TransportType::TrainRer | TransportType::TrainTransilien => {
                EmissionsCode::RerOrTransilien
            }
            TransportType::TrainTer => EmissionsCode::Ter,
            TransportType::TrainTgv => EmissionsCode::Tgv,
            TransportType::Tram => EmissionsCode::Tram,
            TransportType::Ferry | TransportType::FastBoat => {
                return Err(CarbonError::NoEmissionsEquivalent(self));
            }
        };
        Ok(code)
    }
}

impl FromStr for TransportType {
    type Err = CarbonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s)
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

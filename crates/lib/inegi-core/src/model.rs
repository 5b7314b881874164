//! Shared entity model for both upstream APIs.
//!
//! Raw upstream JSON shapes never cross this boundary: the client modules map
//! each API's payload into these types, and everything surfaced to a caller
//! carries both its code and its human label.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Publication cadence of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Periodicity {
    Annual,
    Quarterly,
    Monthly,
}

impl Periodicity {
    /// Maps an upstream `FREQ` descriptor to a periodicity.
    ///
    /// The BISE API reports frequency as a Spanish or English descriptor.
    /// Unrecognized descriptors fall back to annual, the most common cadence
    /// in the catalog.
    #[must_use]
    pub fn from_freq_descriptor(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        if lowered.contains("mensual") || lowered.contains("monthly") {
            Self::Monthly
        } else if lowered.contains("trimestral") || lowered.contains("quarterly") {
            Self::Quarterly
        } else {
            Self::Annual
        }
    }
}

/// Geographic granularity at which a value is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageLevel {
    National,
    State,
    Municipal,
}

impl CoverageLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::National => "national",
            Self::State => "state",
            Self::Municipal => "municipal",
        }
    }
}

/// A resolved indicator reference: canonical code plus display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorRef {
    pub code: String,
    pub name: String,
    pub unit: String,
    pub periodicity: Periodicity,
    pub coverage: Vec<CoverageLevel>,
}

impl IndicatorRef {
    #[must_use]
    pub fn covers(&self, level: CoverageLevel) -> bool {
        self.coverage.contains(&level)
    }
}

/// One candidate from a catalog search, always code plus label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorCandidate {
    pub code: String,
    pub name: String,
}

/// Resolver output: the chosen indicator plus the full candidate list, so
/// ambiguity stays visible to the caller instead of being discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIndicator {
    pub indicator: IndicatorRef,
    pub candidates: Vec<IndicatorCandidate>,
}

/// A geographic scope: national, one state, or one municipality.
///
/// State codes follow the INEGI two-digit entity scheme ("01".."32");
/// municipal codes are five digits, the enclosing state followed by the
/// three-digit municipality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", content = "code", rename_all = "lowercase")]
pub enum GeoScope {
    National,
    State(String),
    Municipal(String),
}

impl Default for GeoScope {
    fn default() -> Self {
        Self::National
    }
}

impl GeoScope {
    #[must_use]
    pub const fn national() -> Self {
        Self::National
    }

    /// Builds a state scope from a two-digit entity code.
    ///
    /// # Errors
    /// Returns `InvalidParameter` when the code is not a two-digit number in
    /// "01".."32".
    pub fn state(code: &str) -> ApiResult<Self> {
        if is_entity_code(code) {
            Ok(Self::State(code.to_string()))
        } else {
            Err(ApiError::InvalidParameter(format!(
                "state code must be a two-digit entity code between 01 and 32, got '{code}'"
            )))
        }
    }

    /// Builds a municipal scope from a five-digit code whose first two digits
    /// are a valid enclosing state.
    ///
    /// # Errors
    /// Returns `InvalidParameter` when the code is not five digits or its
    /// state prefix is out of range.
    pub fn municipal(code: &str) -> ApiResult<Self> {
        if code.len() == 5 && code.chars().all(|c| c.is_ascii_digit()) && is_entity_code(&code[..2])
        {
            Ok(Self::Municipal(code.to_string()))
        } else {
            Err(ApiError::InvalidParameter(format!(
                "municipal code must be five digits with a valid state prefix, got '{code}'"
            )))
        }
    }

    #[must_use]
    pub const fn level(&self) -> CoverageLevel {
        match self {
            Self::National => CoverageLevel::National,
            Self::State(_) => CoverageLevel::State,
            Self::Municipal(_) => CoverageLevel::Municipal,
        }
    }

    /// The enclosing two-digit entity code, when the scope has one.
    #[must_use]
    pub fn entity_code(&self) -> Option<&str> {
        match self {
            Self::National => None,
            Self::State(code) => Some(code),
            Self::Municipal(code) => Some(&code[..2]),
        }
    }

    /// The area path segment expected by the indicator API.
    #[must_use]
    pub fn bise_area_code(&self) -> String {
        match self {
            Self::National => "00".to_string(),
            Self::State(code) => format!("{code}000"),
            Self::Municipal(code) => code.clone(),
        }
    }

    /// The area key expected by the registry quantification endpoint.
    #[must_use]
    pub fn denue_area_code(&self) -> String {
        match self {
            Self::National => "0".to_string(),
            Self::State(code) | Self::Municipal(code) => code.clone(),
        }
    }
}

fn is_entity_code(code: &str) -> bool {
    code.len() == 2
        && code.chars().all(|c| c.is_ascii_digit())
        && matches!(code.parse::<u8>(), Ok(1..=32))
}

/// One observation in a time series. `value: None` is the upstream "no data"
/// marker and is never coerced to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub period: String,
    pub value: Option<f64>,
}

/// A normalized time series for one (indicator, scope) pair, chronologically
/// ascending with no duplicate periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub indicator: IndicatorRef,
    pub scope: GeoScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub points: Vec<SeriesPoint>,
}

impl TimeSeries {
    /// The most recent observation, when the series has any.
    #[must_use]
    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }
}

/// A geographic point as reported by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One business establishment from the registry directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Establishment {
    pub id: String,
    pub name: String,
    pub activity_code: String,
    pub activity_description: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ageb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manzana: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// A bounded window of registry results.
///
/// `total_available` is known only when the result set was exhausted;
/// `has_more` reports whether upstream may hold further records beyond the
/// returned window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstablishmentPage {
    pub items: Vec<Establishment>,
    pub total_available: Option<u64>,
    pub has_more: bool,
}

/// Establishment count for one (sector, area) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorCount {
    pub sector_code: String,
    pub area: GeoScope,
    pub count: u64,
}

/// Aggregation result: the exhaustive count, the upstream-reported total when
/// one was obtainable, and a warning when the two disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorCountReport {
    #[serde(flatten)]
    pub count: SectorCount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

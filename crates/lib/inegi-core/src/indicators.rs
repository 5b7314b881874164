//! Client for the BISE indicator API: time-series fetch and live catalog
//! search.
//!
//! The upstream path shape is replicated exactly:
//! `INDICATOR/{id}/{lang}/{area}/{latest}/BISE/2.0/{token}?type=json`, where
//! `{latest}` is the inverse of the historical flag and `{area}` follows the
//! `00` / `{state}000` / `{municipal}` scheme.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::model::{GeoScope, IndicatorCandidate, IndicatorRef, SeriesPoint, TimeSeries};
use crate::transport::{ApiRequest, TokenPlacement, Transport};

pub const INDICADORES_BASE_URL: &str =
    "https://www.inegi.org.mx/app/api/indicadores/desarrolladores/jsonxml";

/// Environment variable expected to hold the indicator API token.
pub const INDICADORES_TOKEN_VAR: &str = "INEGI_INDICADORES_TOKEN";

const SOURCE_BANK: &str = "BISE";
const API_VERSION: &str = "2.0";
const CATALOG_INDICATORS: &str = "CL_INDICATOR";

/// Unit and cadence descriptors extracted from a series response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesDescriptor {
    pub unit: Option<String>,
    pub frequency: Option<String>,
}

pub struct IndicadoresClient<T> {
    transport: Arc<T>,
    base_url: String,
    token: Option<String>,
    language: String,
}

impl<T> Clone for IndicadoresClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            language: self.language.clone(),
        }
    }
}

impl<T: Transport> IndicadoresClient<T> {
    #[must_use]
    pub fn new(transport: Arc<T>, token: Option<String>) -> Self {
        Self {
            transport,
            base_url: INDICADORES_BASE_URL.to_string(),
            token,
            language: "es".to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    fn token(&self) -> ApiResult<&str> {
        self.token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or(ApiError::MissingCredential(INDICADORES_TOKEN_VAR))
    }

    /// Fetches the series for one (indicator, scope) pair.
    ///
    /// `historical = false` requests only the latest available period, the
    /// smaller default payload; `historical = true` requests the full range.
    /// Coverage is validated before the request is built, so a mismatched
    /// scope never reaches the network.
    ///
    /// # Errors
    /// `UnsupportedScope` when the indicator does not cover the scope level,
    /// `MissingCredential` without a token, or any transport failure.
    pub async fn fetch(
        &self,
        indicator: &IndicatorRef,
        scope: &GeoScope,
        historical: bool,
    ) -> ApiResult<TimeSeries> {
        if !indicator.covers(scope.level()) {
            return Err(ApiError::UnsupportedScope {
                indicator: indicator.code.clone(),
                level: scope.level().as_str().to_string(),
            });
        }
        let token = self.token()?;
        let area = scope.bise_area_code();
        let latest_only = if historical { "false" } else { "true" };
        let request = ApiRequest::new(&self.base_url, token, TokenPlacement::PathSegment)
            .with_segments([
                "INDICATOR",
                indicator.code.as_str(),
                self.language.as_str(),
                area.as_str(),
                latest_only,
                SOURCE_BANK,
                API_VERSION,
            ])
            .with_query("type", "json");
        let payload = self.transport.get_json(&request).await?;
        series_from_payload(indicator, scope, &payload)
    }

    /// Searches the live indicator catalog for a free-text term or code.
    ///
    /// Upstream performs the matching and returns a ranked list; an empty
    /// list is a valid zero-match result, not a failure.
    ///
    /// # Errors
    /// `MissingCredential` without a token, `MalformedResponse` when the
    /// catalog shape is missing, or any transport failure.
    pub async fn search_catalog(&self, query: &str) -> ApiResult<Vec<IndicatorCandidate>> {
        let token = self.token()?;
        let term = if query.trim().is_empty() { "null" } else { query };
        let request = ApiRequest::new(&self.base_url, token, TokenPlacement::PathSegment)
            .with_segments([
                CATALOG_INDICATORS,
                term,
                self.language.as_str(),
                SOURCE_BANK,
                API_VERSION,
            ])
            .with_query("type", "json");
        let payload = self.transport.get_json(&request).await?;
        candidates_from_payload(&payload)
    }

    /// Probes the unit and cadence descriptors of an indicator with a
    /// latest-value national request.
    ///
    /// # Errors
    /// `MissingCredential` without a token, or any transport failure.
    pub async fn describe(&self, code: &str) -> ApiResult<SeriesDescriptor> {
        let token = self.token()?;
        let request = ApiRequest::new(&self.base_url, token, TokenPlacement::PathSegment)
            .with_segments([
                "INDICATOR",
                code,
                self.language.as_str(),
                "00",
                "true",
                SOURCE_BANK,
                API_VERSION,
            ])
            .with_query("type", "json");
        let payload = self.transport.get_json(&request).await?;
        let serie = first_series(&payload);
        Ok(SeriesDescriptor {
            unit: serie.and_then(|s| string_value(s.get("UNIT"))),
            frequency: serie.and_then(|s| string_value(s.get("FREQ"))),
        })
    }
}

fn first_series(payload: &Value) -> Option<&Value> {
    payload
        .get("Series")
        .and_then(Value::as_array)
        .and_then(|series| series.first())
}

fn series_from_payload(
    indicator: &IndicatorRef,
    scope: &GeoScope,
    payload: &Value,
) -> ApiResult<TimeSeries> {
    if !payload.is_object() {
        return Err(ApiError::MalformedResponse(
            "indicator response is not a JSON object".to_string(),
        ));
    }
    let serie = first_series(payload);
    Ok(TimeSeries {
        indicator: indicator.clone(),
        scope: scope.clone(),
        frequency: serie.and_then(|s| string_value(s.get("FREQ"))),
        last_update: serie.and_then(|s| string_value(s.get("LASTUPDATE"))),
        source: serie.and_then(|s| string_value(s.get("SOURCE"))),
        points: serie.map_or_else(Vec::new, |s| points_from_observations(s.get("OBSERVATIONS"))),
    })
}

/// Normalizes upstream observations: chronological ascending order, no
/// duplicate periods, null and placeholder values preserved as absent.
fn points_from_observations(observations: Option<&Value>) -> Vec<SeriesPoint> {
    let mut points: Vec<SeriesPoint> = observations
        .and_then(Value::as_array)
        .map(|rows| rows.iter().filter_map(point_from_row).collect())
        .unwrap_or_default();
    points.sort_by(|a, b| a.period.cmp(&b.period));
    points.dedup_by(|a, b| a.period == b.period);
    points
}

fn point_from_row(row: &Value) -> Option<SeriesPoint> {
    let period = string_value(row.get("TIME_PERIOD"))?;
    let value = row.get("OBS_VALUE").and_then(numeric_value);
    Some(SeriesPoint { period, value })
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
                None
            } else {
                trimmed.parse().ok()
            }
        }
        _ => None,
    }
}

fn candidates_from_payload(payload: &Value) -> ApiResult<Vec<IndicatorCandidate>> {
    let rows = payload
        .get("CODE")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ApiError::MalformedResponse("catalog response is missing the CODE list".to_string())
        })?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let code = string_value(row.get("value"))?;
            let name = string_value(row.get("description"))?;
            Some(IndicatorCandidate { code, name })
        })
        .collect())
}

fn string_value(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn observations_are_sorted_and_deduplicated() {
        let observations = json!([
            {"TIME_PERIOD": "2021", "OBS_VALUE": "3.0"},
            {"TIME_PERIOD": "2019", "OBS_VALUE": "1.0"},
            {"TIME_PERIOD": "2020", "OBS_VALUE": "2.0"},
            {"TIME_PERIOD": "2020", "OBS_VALUE": "9.9"},
        ]);
        let points = points_from_observations(Some(&observations));
        let periods: Vec<&str> = points.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(periods, ["2019", "2020", "2021"]);
        assert_eq!(points[1].value, Some(2.0));
    }

    #[test]
    fn placeholder_values_become_absent_not_zero() {
        let observations = json!([
            {"TIME_PERIOD": "2019", "OBS_VALUE": null},
            {"TIME_PERIOD": "2020", "OBS_VALUE": ""},
            {"TIME_PERIOD": "2021", "OBS_VALUE": "null"},
            {"TIME_PERIOD": "2022", "OBS_VALUE": "0"},
        ]);
        let points = points_from_observations(Some(&observations));
        assert_eq!(points[0].value, None);
        assert_eq!(points[1].value, None);
        assert_eq!(points[2].value, None);
        assert_eq!(points[3].value, Some(0.0));
    }

    #[test]
    fn rows_without_a_period_are_dropped() {
        let observations = json!([
            {"OBS_VALUE": "5.0"},
            {"TIME_PERIOD": "2020", "OBS_VALUE": "2.0"},
        ]);
        let points = points_from_observations(Some(&observations));
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].period, "2020");
    }

    #[test]
    fn catalog_rows_require_code_and_description() {
        let payload = json!({"CODE": [
            {"value": "1002000001", "description": "Población total"},
            {"value": "", "description": "sin código"},
            {"description": "sin valor"},
        ]});
        let candidates = candidates_from_payload(&payload).expect("CODE list present");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].code, "1002000001");
    }

    #[test]
    fn missing_code_list_is_malformed() {
        let payload = json!({"unexpected": []});
        assert!(matches!(
            candidates_from_payload(&payload),
            Err(ApiError::MalformedResponse(_))
        ));
    }
}

//! Client for the DENUE business-registry API: term, radius, and
//! area/activity searches plus the quantification endpoint.
//!
//! The registry answers HTTP 404 for zero-match queries; that case is
//! normalized to an empty page here, because an empty result is not a
//! failure. All search variants share one pagination driver bounded by the
//! upstream per-request record cap.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::model::{Coordinates, Establishment, EstablishmentPage, GeoScope};
use crate::transport::{ApiRequest, TokenPlacement, Transport};

pub const DENUE_BASE_URL: &str = "https://www.inegi.org.mx/app/api/denue/v1/consulta";

/// Environment variable expected to hold the registry API token.
pub const DENUE_TOKEN_VAR: &str = "INEGI_DENUE_TOKEN";

/// Upstream record cap per request; larger limits page in windows this size.
pub const MAX_PAGE_SIZE: usize = 200;

/// Documented upstream bound for radius searches, in meters.
pub const MAX_RADIUS_METERS: u32 = 5_000;

/// Filters for the detailed area/activity search.
#[derive(Debug, Clone, Default)]
pub struct AreaQuery {
    pub scope: GeoScope,
    /// Classification code, routed to the sector/subsector/rama/clase slot
    /// by its length.
    pub activity_code: Option<String>,
    /// Establishment-name filter.
    pub name: Option<String>,
}

/// One row of the quantification endpoint: counts per activity and area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantifyRow {
    pub activity: String,
    pub area: String,
    pub total: u64,
}

pub struct DenueClient<T> {
    transport: Arc<T>,
    base_url: String,
    token: Option<String>,
}

impl<T> Clone for DenueClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            base_url: self.base_url.clone(),
            token: self.token.clone(),
        }
    }
}

impl<T: Transport> DenueClient<T> {
    #[must_use]
    pub fn new(transport: Arc<T>, token: Option<String>) -> Self {
        Self {
            transport,
            base_url: DENUE_BASE_URL.to_string(),
            token,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn token(&self) -> ApiResult<&str> {
        self.token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or(ApiError::MissingCredential(DENUE_TOKEN_VAR))
    }

    /// Searches establishments by free text, optionally restricted to the
    /// state enclosing `scope`.
    ///
    /// Scoped searches use the paginated `BuscarEntidad` endpoint; unscoped
    /// searches use `Buscar`, which upstream answers in a single window.
    ///
    /// # Errors
    /// `InvalidParameter` for an empty term or zero limit,
    /// `MissingCredential` without a token, or any transport failure.
    pub async fn search_by_term(
        &self,
        term: &str,
        scope: Option<&GeoScope>,
        limit: usize,
    ) -> ApiResult<EstablishmentPage> {
        validate_limit(limit)?;
        let term = term.trim();
        if term.is_empty() {
            return Err(ApiError::InvalidParameter(
                "search term must not be empty".to_string(),
            ));
        }
        let token = self.token()?;
        match scope.and_then(GeoScope::entity_code) {
            Some(entity) => {
                let entity = entity.to_string();
                self.paged(limit, |start, end| {
                    ApiRequest::new(&self.base_url, token, TokenPlacement::PathSegment)
                        .with_segments([
                            "BuscarEntidad",
                            term,
                            entity.as_str(),
                            start.to_string().as_str(),
                            end.to_string().as_str(),
                        ])
                })
                .await
            }
            None => {
                let request = ApiRequest::new(&self.base_url, token, TokenPlacement::PathSegment)
                    .with_segments(["Buscar", term]);
                self.single_page(request, limit).await
            }
        }
    }

    /// Searches establishments around a coordinate.
    ///
    /// The radius must fall within the upstream-supported bound and the
    /// coordinates within valid ranges; violations fail before any network
    /// call. An empty term searches everything within the radius.
    ///
    /// # Errors
    /// `InvalidParameter` for out-of-range inputs, `MissingCredential`
    /// without a token, or any transport failure.
    pub async fn search_by_radius(
        &self,
        term: &str,
        lat: f64,
        lon: f64,
        radius_m: u32,
        limit: usize,
    ) -> ApiResult<EstablishmentPage> {
        validate_limit(limit)?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(ApiError::InvalidParameter(format!(
                "coordinates ({lat}, {lon}) are out of range"
            )));
        }
        if radius_m == 0 || radius_m > MAX_RADIUS_METERS {
            return Err(ApiError::InvalidParameter(format!(
                "radius must be between 1 and {MAX_RADIUS_METERS} meters, got {radius_m}"
            )));
        }
        let token = self.token()?;
        let term = term.trim();
        let term = if term.is_empty() { "todos" } else { term };
        let coords = format!("{lat},{lon}");
        let request = ApiRequest::new(&self.base_url, token, TokenPlacement::PathSegment)
            .with_segments([
                "Buscar",
                term,
                coords.as_str(),
                radius_m.to_string().as_str(),
            ]);
        self.single_page(request, limit).await
    }

    /// Searches establishments by classification code within a geographic
    /// scope. Shorthand for [`Self::search_area`] with only the activity
    /// filter set.
    ///
    /// # Errors
    /// `InvalidParameter` for a malformed activity code or zero limit,
    /// `MissingCredential` without a token, or any transport failure.
    pub async fn search_by_activity_and_area(
        &self,
        activity_code: &str,
        scope: &GeoScope,
        limit: usize,
    ) -> ApiResult<EstablishmentPage> {
        let query = AreaQuery {
            scope: scope.clone(),
            activity_code: Some(activity_code.to_string()),
            name: None,
        };
        self.search_area(&query, limit).await
    }

    /// Detailed area/activity search over the `BuscarAreaAct` endpoint,
    /// which also returns AGEB/manzana geostatistical fields.
    ///
    /// # Errors
    /// `InvalidParameter` for a malformed activity code or zero limit,
    /// `MissingCredential` without a token, or any transport failure.
    pub async fn search_area(&self, query: &AreaQuery, limit: usize) -> ApiResult<EstablishmentPage> {
        validate_limit(limit)?;
        let slots = match query.activity_code.as_deref() {
            Some(code) => activity_slots(code)?,
            None => default_activity_slots(),
        };
        let token = self.token()?;
        let entity = query
            .scope
            .entity_code()
            .map_or_else(|| "0".to_string(), ToString::to_string);
        let municipality = match &query.scope {
            GeoScope::Municipal(code) => code[2..].to_string(),
            GeoScope::National | GeoScope::State(_) => "0".to_string(),
        };
        let name = query
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("0")
            .to_string();
        self.paged(limit, |start, end| {
            ApiRequest::new(&self.base_url, token, TokenPlacement::PathSegment).with_segments([
                "BuscarAreaAct",
                entity.as_str(),
                municipality.as_str(),
                "0",
                "0",
                "0",
                slots[0].as_str(),
                slots[1].as_str(),
                slots[2].as_str(),
                slots[3].as_str(),
                name.as_str(),
                start.to_string().as_str(),
                end.to_string().as_str(),
                "0",
            ])
        })
        .await
    }

    /// Upstream-reported establishment counts per activity and area.
    ///
    /// # Errors
    /// `InvalidParameter` for malformed codes or stratum, `MissingCredential`
    /// without a token, or any transport failure.
    pub async fn quantify(
        &self,
        activity_code: &str,
        scope: &GeoScope,
        stratum: Option<u8>,
    ) -> ApiResult<Vec<QuantifyRow>> {
        validate_quantify_code(activity_code)?;
        if let Some(stratum) = stratum {
            if !(1..=7).contains(&stratum) {
                return Err(ApiError::InvalidParameter(format!(
                    "stratum must be between 1 and 7, got {stratum}"
                )));
            }
        }
        let token = self.token()?;
        let area = scope.denue_area_code();
        let stratum = stratum.map_or_else(|| "0".to_string(), |value| value.to_string());
        let request = ApiRequest::new(&self.base_url, token, TokenPlacement::PathSegment)
            .with_segments([
                "Cuantificar",
                activity_code,
                area.as_str(),
                stratum.as_str(),
            ]);
        let rows = match self.transport.get_json(&request).await {
            Ok(payload) => quantify_rows_from_payload(&payload)?,
            Err(ApiError::NotFound(_)) => Vec::new(),
            Err(err) => return Err(err),
        };
        Ok(rows)
    }

    /// Pages through a windowed endpoint until `limit` is reached or a short
    /// window signals exhaustion. Windows never exceed the upstream record
    /// cap, so a limit of `n` issues at most `ceil(n / MAX_PAGE_SIZE)`
    /// requests.
    async fn paged(
        &self,
        limit: usize,
        build_window: impl Fn(usize, usize) -> ApiRequest,
    ) -> ApiResult<EstablishmentPage> {
        let mut items: Vec<Establishment> = Vec::new();
        while items.len() < limit {
            let window = (limit - items.len()).min(MAX_PAGE_SIZE);
            let start = items.len() + 1;
            let end = items.len() + window;
            let request = build_window(start, end);
            let rows = match self.transport.get_json(&request).await {
                Ok(payload) => establishments_from_payload(&payload)?,
                Err(ApiError::NotFound(_)) => Vec::new(),
                Err(err) => return Err(err),
            };
            let received = rows.len();
            items.extend(rows.into_iter().take(window));
            if received < window {
                let total = items.len() as u64;
                return Ok(EstablishmentPage {
                    items,
                    total_available: Some(total),
                    has_more: false,
                });
            }
        }
        Ok(EstablishmentPage {
            items,
            total_available: None,
            has_more: true,
        })
    }

    /// Issues one request against an endpoint without windowing and bounds
    /// the result to `limit` locally.
    async fn single_page(
        &self,
        request: ApiRequest,
        limit: usize,
    ) -> ApiResult<EstablishmentPage> {
        let rows = match self.transport.get_json(&request).await {
            Ok(payload) => establishments_from_payload(&payload)?,
            Err(ApiError::NotFound(_)) => Vec::new(),
            Err(err) => return Err(err),
        };
        let total = rows.len() as u64;
        let has_more = rows.len() > limit;
        let mut items = rows;
        items.truncate(limit);
        Ok(EstablishmentPage {
            items,
            total_available: Some(total),
            has_more,
        })
    }
}

fn validate_limit(limit: usize) -> ApiResult<()> {
    if limit == 0 {
        return Err(ApiError::InvalidParameter(
            "limit must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn default_activity_slots() -> [String; 4] {
    std::array::from_fn(|_| "0".to_string())
}

/// Routes a classification code to its sector/subsector/rama/clase slot by
/// length. The area/activity endpoint has no slot for five-digit subrama
/// codes.
fn activity_slots(code: &str) -> ApiResult<[String; 4]> {
    let code = code.trim();
    if !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()) {
        let slot = match code.len() {
            2 => Some(0),
            3 => Some(1),
            4 => Some(2),
            6 => Some(3),
            _ => None,
        };
        if let Some(slot) = slot {
            let mut slots = [
                "0".to_string(),
                "0".to_string(),
                "0".to_string(),
                "0".to_string(),
            ];
            slots[slot] = code.to_string();
            return Ok(slots);
        }
    }
    Err(ApiError::InvalidParameter(format!(
        "activity code must be 2, 3, 4, or 6 digits, got '{code}'"
    )))
}

fn validate_quantify_code(code: &str) -> ApiResult<()> {
    let valid = !code.trim().is_empty()
        && code
            .split(',')
            .all(|part| !part.is_empty() && part.len() <= 6 && part.chars().all(|c| c.is_ascii_digit()));
    if valid {
        Ok(())
    } else {
        Err(ApiError::InvalidParameter(format!(
            "activity key must be digits (optionally comma-separated), got '{code}'"
        )))
    }
}

fn establishments_from_payload(payload: &Value) -> ApiResult<Vec<Establishment>> {
    let rows = payload.as_array().ok_or_else(|| {
        ApiError::MalformedResponse("registry response is not a JSON array".to_string())
    })?;
    Ok(rows.iter().map(establishment_from_row).collect())
}

/// Maps one raw registry record into the shared entity model. The two
/// registry endpoints use different field casings, so every lookup tries the
/// known spellings in order.
fn establishment_from_row(row: &Value) -> Establishment {
    Establishment {
        id: string_field(row, &["Id", "CLEE"]).unwrap_or_default(),
        name: string_field(row, &["Nombre", "Razon_social"]).unwrap_or_default(),
        activity_code: string_field(
            row,
            &["CLASE_ACTIVIDAD_ID", "Clase_actividad_id", "Id_clase_actividad"],
        )
        .unwrap_or_default(),
        activity_description: string_field(row, &["Clase_actividad", "Nombre_act"])
            .unwrap_or_default(),
        address: compose_address(row),
        coordinates: coordinates_from_row(row),
        ageb: string_field(row, &["AGEB", "Ageb"]),
        manzana: string_field(row, &["Manzana", "MANZANA"]),
        phone: string_field(row, &["Telefono"]),
        email: string_field(row, &["Correo_e"]),
        website: string_field(row, &["Sitio_internet"]),
    }
}

fn compose_address(row: &Value) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut street = String::new();
    if let Some(calle) = string_field(row, &["Calle"]) {
        street.push_str(&calle);
    }
    if let Some(numero) = string_field(row, &["Num_Exterior", "Numero_Exterior"]) {
        if !street.is_empty() {
            street.push(' ');
        }
        street.push_str(&numero);
    }
    if !street.is_empty() {
        parts.push(street);
    }
    if let Some(colonia) = string_field(row, &["Colonia"]) {
        parts.push(colonia);
    }
    if let Some(cp) = string_field(row, &["CP"]) {
        parts.push(format!("CP {cp}"));
    }
    if parts.is_empty() {
        string_field(row, &["Ubicacion"]).unwrap_or_default()
    } else {
        parts.join(", ")
    }
}

/// Coordinates absent or blank upstream stay absent; they are never defaulted
/// to the origin.
fn coordinates_from_row(row: &Value) -> Option<Coordinates> {
    let lat = float_field(row, &["Latitud", "LATITUD"])?;
    let lon = float_field(row, &["Longitud", "LONGITUD"])?;
    Some(Coordinates { lat, lon })
}

fn quantify_rows_from_payload(payload: &Value) -> ApiResult<Vec<QuantifyRow>> {
    let rows = payload.as_array().ok_or_else(|| {
        ApiError::MalformedResponse("quantification response is not a JSON array".to_string())
    })?;
    Ok(rows
        .iter()
        .filter_map(|row| {
            let total = row.get("Total").and_then(unsigned_value)?;
            Some(QuantifyRow {
                activity: string_field(row, &["AE"]).unwrap_or_default(),
                area: string_field(row, &["AG"]).unwrap_or_default(),
                total,
            })
        })
        .collect())
}

fn string_field(row: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        row.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(ToString::to_string)
    })
}

fn float_field(row: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| {
        let value = row.get(key)?;
        match value {
            Value::Number(number) => number.as_f64(),
            Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    trimmed.parse().ok()
                }
            }
            _ => None,
        }
    })
}

fn unsigned_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;

    struct UnreachableTransport;

    #[async_trait]
    impl Transport for UnreachableTransport {
        async fn get_json(&self, _request: &ApiRequest) -> ApiResult<Value> {
            panic!("transport must not be reached for invalid parameters");
        }
    }

    fn client() -> DenueClient<UnreachableTransport> {
        DenueClient::new(Arc::new(UnreachableTransport), Some("T".to_string()))
    }

    #[test]
    fn activity_codes_route_to_length_slots() {
        assert_eq!(activity_slots("46").expect("sector"), ["46", "0", "0", "0"]);
        assert_eq!(
            activity_slots("464").expect("subsector"),
            ["0", "464", "0", "0"]
        );
        assert_eq!(activity_slots("4641").expect("rama"), ["0", "0", "4641", "0"]);
        assert_eq!(
            activity_slots("462112").expect("clase"),
            ["0", "0", "0", "462112"]
        );
        assert!(activity_slots("46211").is_err());
        assert!(activity_slots("46a").is_err());
    }

    #[tokio::test]
    async fn out_of_bound_radius_fails_before_any_call() {
        let err = client()
            .search_by_radius("cafe", 20.97, -89.62, MAX_RADIUS_METERS + 1, 10)
            .await
            .expect_err("radius beyond the upstream bound");
        assert!(matches!(err, ApiError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn out_of_range_coordinates_fail_before_any_call() {
        let err = client()
            .search_by_radius("cafe", 120.0, -89.62, 250, 10)
            .await
            .expect_err("latitude beyond 90 degrees");
        assert!(matches!(err, ApiError::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn missing_token_is_reported_as_credential_failure() {
        let client: DenueClient<UnreachableTransport> =
            DenueClient::new(Arc::new(UnreachableTransport), None);
        let err = client
            .search_by_term("tortillerias", None, 5)
            .await
            .expect_err("no token configured");
        assert!(matches!(err, ApiError::MissingCredential(DENUE_TOKEN_VAR)));
    }

    #[test]
    fn absent_coordinates_stay_absent() {
        let row = json!({
            "Id": "123",
            "Nombre": "ABARROTES DON PEPE",
            "Clase_actividad": "Comercio al por menor en tiendas de abarrotes",
            "Latitud": "",
            "Longitud": ""
        });
        let establishment = establishment_from_row(&row);
        assert!(establishment.coordinates.is_none());
    }

    #[test]
    fn coordinates_parse_from_string_fields() {
        let row = json!({
            "Id": "123",
            "Nombre": "CAFE CENTRO",
            "Latitud": "20.9673702",
            "Longitud": "-89.6245316"
        });
        let establishment = establishment_from_row(&row);
        let coordinates = establishment.coordinates.expect("coordinates present");
        assert!((coordinates.lat - 20.967_370_2).abs() < 1e-9);
        assert!((coordinates.lon + 89.624_531_6).abs() < 1e-9);
    }

    #[test]
    fn address_prefers_street_parts_over_raw_location() {
        let row = json!({
            "Calle": "CALLE 60",
            "Num_Exterior": "491",
            "Colonia": "CENTRO",
            "CP": "97000",
            "Ubicacion": "MERIDA"
        });
        let establishment = establishment_from_row(&row);
        assert_eq!(establishment.address, "CALLE 60 491, CENTRO, CP 97000");
    }

    #[test]
    fn quantify_totals_accept_strings_and_numbers() {
        let payload = json!([
            {"AE": "462112", "AG": "31", "Total": "128"},
            {"AE": "462112", "AG": "19", "Total": 75},
        ]);
        let rows = quantify_rows_from_payload(&payload).expect("array payload");
        assert_eq!(rows[0].total, 128);
        assert_eq!(rows[1].total, 75);
    }
}

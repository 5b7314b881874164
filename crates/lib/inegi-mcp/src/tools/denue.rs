use inegi_core::aggregate::count_by_sector;
use inegi_core::denue::AreaQuery;
use inegi_core::error::{ApiError, ApiResult};
use inegi_core::model::{EstablishmentPage, GeoScope};
use inegi_core::transport::Transport;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, ErrorCode},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::{InegiMcp, helpers};

const DEFAULT_SEARCH_LIMIT: usize = 10;
const DEFAULT_COORDINATES_LIMIT: usize = 5;
const DEFAULT_RADIUS_METERS: u32 = 250;

/// Parameters for the free-text establishment search.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BuscarEstablecimientosParams {
    /// Palabra(s) a buscar: nombre, actividad o ubicación.
    pub termino: String,
    /// Número máximo de resultados. Default: 10.
    pub limite: Option<usize>,
    /// Código de entidad federativa para acotar la búsqueda (ej: '31').
    pub entidad: Option<String>,
    /// Latitud del centro de búsqueda (requiere longitud).
    pub latitud: Option<f64>,
    /// Longitud del centro de búsqueda (requiere latitud).
    pub longitud: Option<f64>,
    /// Radio de búsqueda en metros para la modalidad por coordenadas. Default: 250.
    pub radio: Option<u32>,
}

/// Parameters for the detailed area/activity search.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BuscarAreaActParams {
    /// Código de entidad federativa (ej: '31'; '0' para todas).
    pub entidad: String,
    /// Código de municipio dentro de la entidad (ej: '050').
    pub municipio: Option<String>,
    /// Filtro por nombre de establecimiento (ej: 'OXXO').
    pub nombre: Option<String>,
    /// Código de clase de actividad económica (2, 3, 4 o 6 dígitos).
    pub clase: Option<String>,
    /// Número máximo de resultados. Default: 10.
    pub limite: Option<usize>,
}

/// Parameters for establishment counting.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CuantificarEstablecimientosParams {
    /// Código de actividad económica (2-6 dígitos, ej: '462112').
    pub actividad_economica: String,
    /// Área geográfica: '0'=país, dos dígitos=estado, cinco=municipio.
    pub area_geografica: String,
    /// Estrato de personal ocupado (1..7); al indicarlo se devuelven los
    /// conteos reportados por el DENUE para ese estrato.
    pub estrato: Option<u8>,
}

/// Parameters for coordinate extraction.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ObtenerCoordenadasParams {
    /// Nombre o tipo de establecimiento a buscar.
    pub termino: String,
    /// Número máximo de resultados. Default: 5.
    pub limite: Option<usize>,
    /// Latitud del centro de búsqueda (requiere longitud).
    pub latitud: Option<f64>,
    /// Longitud del centro de búsqueda (requiere latitud).
    pub longitud: Option<f64>,
    /// Radio de búsqueda en metros. Default: 250.
    pub radio: Option<u32>,
}

/// One establishment projected to its location fields. Coordinates stay
/// absent when the registry has no location on file.
#[derive(Debug, Serialize)]
pub struct CoordinateRow {
    pub id: String,
    pub nombre: String,
    pub direccion: String,
    pub latitud: Option<f64>,
    pub longitud: Option<f64>,
}

/// Coordinate extraction summary.
#[derive(Debug, Serialize)]
pub struct CoordinateReport {
    pub total: usize,
    pub con_coordenadas: usize,
    pub establecimientos: Vec<CoordinateRow>,
}

#[tool_router(router = tool_router_denue, vis = "pub")]
impl<T: Transport> InegiMcp<T> {
    #[tool(
        description = "Busca establecimientos en el DENUE por término; opcionalmente acotado a una entidad, o por coordenadas y radio (máximo 5000 m). Una lista vacía significa cero coincidencias."
    )]
    async fn buscar_establecimientos(
        &self,
        Parameters(params): Parameters<BuscarEstablecimientosParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let page = self
            .term_or_radius_search(
                &params.termino,
                params.entidad.as_deref(),
                params.latitud,
                params.longitud,
                params.radio,
                params.limite.unwrap_or(DEFAULT_SEARCH_LIMIT),
            )
            .await?;
        Ok(CallToolResult::success(vec![Content::json(page)?]))
    }

    #[tool(
        description = "Búsqueda detallada de establecimientos por entidad, municipio, nombre y clase de actividad, con campos geoestadísticos (AGEB y manzana) y clasificación económica."
    )]
    async fn buscar_area_act(
        &self,
        Parameters(params): Parameters<BuscarAreaActParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let scope =
            area_act_scope(&params.entidad, params.municipio.as_deref()).map_err(helpers::map_err)?;
        let query = AreaQuery {
            scope,
            activity_code: params.clase,
            name: params.nombre,
        };
        let page = self
            .denue
            .search_area(&query, params.limite.unwrap_or(DEFAULT_SEARCH_LIMIT))
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(page)?]))
    }

    #[tool(
        description = "Cuantifica establecimientos por actividad económica y área geográfica. Sin estrato, agota las páginas de resultados y contrasta el conteo con el total reportado (una discrepancia genera una advertencia); con estrato, devuelve los conteos reportados por el DENUE."
    )]
    async fn cuantificar_establecimientos(
        &self,
        Parameters(params): Parameters<CuantificarEstablecimientosParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let scope = quantify_scope(&params.area_geografica).map_err(helpers::map_err)?;
        if let Some(stratum) = params.estrato {
            let rows = self
                .denue
                .quantify(&params.actividad_economica, &scope, Some(stratum))
                .await
                .map_err(helpers::map_err)?;
            return Ok(CallToolResult::success(vec![Content::json(rows)?]));
        }
        let report = count_by_sector(&self.denue, &params.actividad_economica, &scope)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(report)?]))
    }

    #[tool(
        description = "Obtiene las coordenadas geográficas de establecimientos para mapas o análisis espacial. Los establecimientos sin ubicación registrada aparecen sin coordenadas."
    )]
    async fn obtener_coordenadas_establecimientos(
        &self,
        Parameters(params): Parameters<ObtenerCoordenadasParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let page = self
            .term_or_radius_search(
                &params.termino,
                None,
                params.latitud,
                params.longitud,
                params.radio,
                params.limite.unwrap_or(DEFAULT_COORDINATES_LIMIT),
            )
            .await?;
        let report = coordinate_report(&page);
        Ok(CallToolResult::success(vec![Content::json(report)?]))
    }
}

impl<T: Transport> InegiMcp<T> {
    /// Shared dispatch for the term/radius tool surface: coordinates select
    /// the radius mode, otherwise the term search runs, optionally scoped to
    /// a state.
    async fn term_or_radius_search(
        &self,
        term: &str,
        entity: Option<&str>,
        lat: Option<f64>,
        lon: Option<f64>,
        radius: Option<u32>,
        limit: usize,
    ) -> Result<EstablishmentPage, ErrorData> {
        match (lat, lon) {
            (Some(lat), Some(lon)) => self
                .denue
                .search_by_radius(term, lat, lon, radius.unwrap_or(DEFAULT_RADIUS_METERS), limit)
                .await
                .map_err(helpers::map_err),
            (None, None) => {
                let scope = match entity {
                    Some(code) => Some(GeoScope::state(code).map_err(helpers::map_err)?),
                    None => None,
                };
                self.denue
                    .search_by_term(term, scope.as_ref(), limit)
                    .await
                    .map_err(helpers::map_err)
            }
            _ => Err(helpers::mcp_err(
                ErrorCode::INVALID_PARAMS,
                "latitud and longitud must be provided together",
            )),
        }
    }
}

fn coordinate_report(page: &EstablishmentPage) -> CoordinateReport {
    let rows: Vec<CoordinateRow> = page
        .items
        .iter()
        .map(|establishment| CoordinateRow {
            id: establishment.id.clone(),
            nombre: establishment.name.clone(),
            direccion: establishment.address.clone(),
            latitud: establishment.coordinates.map(|c| c.lat),
            longitud: establishment.coordinates.map(|c| c.lon),
        })
        .collect();
    let con_coordenadas = rows.iter().filter(|row| row.latitud.is_some()).count();
    CoordinateReport {
        total: rows.len(),
        con_coordenadas,
        establecimientos: rows,
    }
}

/// Maps the entidad/municipio tool parameters onto a validated scope.
/// An entidad of '0' (or blank) searches every state.
fn area_act_scope(entity: &str, municipality: Option<&str>) -> ApiResult<GeoScope> {
    let entity = entity.trim();
    if entity.is_empty() || entity == "0" {
        if municipality.is_some() {
            return Err(ApiError::InvalidParameter(
                "municipio requires a concrete entidad".to_string(),
            ));
        }
        return Ok(GeoScope::national());
    }
    match municipality.map(str::trim).filter(|m| !m.is_empty() && *m != "0") {
        Some(municipality) => GeoScope::municipal(&format!("{entity}{municipality:0>3}")),
        None => GeoScope::state(entity),
    }
}

/// Maps a quantification area key onto a scope by its length.
fn quantify_scope(area: &str) -> ApiResult<GeoScope> {
    let area = area.trim();
    match area.len() {
        0 | 1 if area.is_empty() || area == "0" => Ok(GeoScope::national()),
        2 => GeoScope::state(area),
        5 => GeoScope::municipal(area),
        _ => Err(ApiError::InvalidParameter(format!(
            "area key must be '0', a two-digit state, or a five-digit municipality, got '{area}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_act_scope_combines_entity_and_municipality() {
        assert_eq!(
            area_act_scope("31", Some("50")).expect("municipal scope"),
            GeoScope::municipal("31050").expect("valid code")
        );
        assert_eq!(
            area_act_scope("31", None).expect("state scope"),
            GeoScope::state("31").expect("valid code")
        );
        assert_eq!(
            area_act_scope("0", None).expect("national scope"),
            GeoScope::national()
        );
        assert!(area_act_scope("0", Some("050")).is_err());
    }

    #[test]
    fn quantify_scope_is_selected_by_key_length() {
        assert_eq!(quantify_scope("0").expect("national"), GeoScope::national());
        assert_eq!(
            quantify_scope("31").expect("state"),
            GeoScope::state("31").expect("valid code")
        );
        assert_eq!(
            quantify_scope("31050").expect("municipal"),
            GeoScope::municipal("31050").expect("valid code")
        );
        assert!(quantify_scope("310").is_err());
    }
}

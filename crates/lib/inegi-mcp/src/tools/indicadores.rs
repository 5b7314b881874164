use inegi_core::catalog::CURATED_INDICATORS;
use inegi_core::compare::{ScopeOutcome, compare_scopes};
use inegi_core::error::{ApiError, ApiResult};
use inegi_core::model::{GeoScope, IndicatorRef, SeriesPoint, TimeSeries};
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

/// Parameters for searching indicators by keyword or code.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BuscarIndicadoresParams {
    /// Término de búsqueda (ej: 'población', 'PIB') o código de indicador.
    pub keyword: String,
}

/// Parameters for searching the full live catalog.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BuscarCatalogoCompletoParams {
    /// Término de búsqueda contra el catálogo completo en línea.
    pub keyword: String,
}

/// Parameters for fetching a time series.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ObtenerSerieTemporalParams {
    /// ID del indicador (ej: '1002000001') o palabra clave resoluble.
    pub indicador_id: String,
    /// true para la serie completa, false para el último dato. Default: true.
    pub historica: Option<bool>,
    /// Área: '00'=nacional, '99'=estatal, '999'=municipal. Default: '00'.
    pub area_geografica: Option<String>,
    /// Código de estado ('31') o municipio ('31050') según el área.
    pub codigo_geo: Option<String>,
}

/// Parameters for comparing one indicator across states.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CompararEstadosParams {
    /// ID del indicador a comparar.
    pub indicador_id: String,
    /// Códigos de estados en el orden deseado (ej: ['31', '19', '09']).
    pub estados: Vec<String>,
    /// true para la serie completa, false para el último dato. Default: false.
    pub historica: Option<bool>,
}

/// One row of the state comparison, in the caller's input order.
#[derive(Debug, Serialize)]
pub struct ComparisonRow {
    pub estado: String,
    pub nombre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ultimo: Option<SeriesPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<TimeSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComparisonRow {
    fn from_outcome(outcome: ScopeOutcome) -> Self {
        let estado = outcome.scope.entity_code().unwrap_or_default().to_string();
        let nombre = outcome.entity.map(ToString::to_string);
        match outcome.series {
            Ok(series) => {
                let ultimo = series.latest().cloned();
                Self {
                    estado,
                    nombre,
                    ultimo,
                    series: Some(series),
                    error: None,
                }
            }
            Err(err) => Self {
                estado,
                nombre,
                ultimo: None,
                series: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// One curated catalog entry as surfaced to the agent.
#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    pub categoria: String,
    #[serde(flatten)]
    pub indicator: IndicatorRef,
}

#[tool_router(router = tool_router_indicadores, vis = "pub")]
impl<T: Transport> InegiMcp<T> {
    #[tool(
        description = "Busca un indicador del INEGI por palabra clave o código. Resuelve primero contra el catálogo curado y, si no hay coincidencia, contra el catálogo completo en línea; devuelve el indicador elegido y la lista de candidatos."
    )]
    async fn buscar_indicadores(
        &self,
        Parameters(params): Parameters<BuscarIndicadoresParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let resolved = self
            .resolver
            .resolve(&params.keyword)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(resolved)?]))
    }

    #[tool(
        description = "Busca en el catálogo completo de indicadores en línea y devuelve la lista ordenada de candidatos (código y nombre). Una lista vacía significa cero coincidencias."
    )]
    async fn buscar_catalogo_completo(
        &self,
        Parameters(params): Parameters<BuscarCatalogoCompletoParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let candidates = self
            .indicators
            .search_catalog(&params.keyword)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(candidates)?]))
    }

    #[tool(
        description = "Obtiene la serie temporal de un indicador a nivel nacional, estatal o municipal. Con historica=false devuelve solo el último dato disponible."
    )]
    async fn obtener_serie_temporal(
        &self,
        Parameters(params): Parameters<ObtenerSerieTemporalParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let scope = scope_from_params(
            params.area_geografica.as_deref(),
            params.codigo_geo.as_deref(),
        )
        .map_err(helpers::map_err)?;
        let resolved = self
            .resolver
            .resolve(&params.indicador_id)
            .await
            .map_err(helpers::map_err)?;
        let series = self
            .indicators
            .fetch(&resolved.indicator, &scope, params.historica.unwrap_or(true))
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(series)?]))
    }

    #[tool(
        description = "Compara un indicador entre varios estados. Devuelve una fila por estado, en el mismo orden de entrada; el fallo de un estado no descarta los demás."
    )]
    async fn comparar_estados(
        &self,
        Parameters(params): Parameters<CompararEstadosParams>,
    ) -> Result<CallToolResult, ErrorData> {
        if params.estados.is_empty() {
            return Err(helpers::mcp_err(
                ErrorCode::INVALID_PARAMS,
                "estados must contain at least one state code",
            ));
        }
        let mut scopes = Vec::with_capacity(params.estados.len());
        for code in &params.estados {
            scopes.push(GeoScope::state(code).map_err(helpers::map_err)?);
        }
        let resolved = self
            .resolver
            .resolve(&params.indicador_id)
            .await
            .map_err(helpers::map_err)?;
        let outcomes = compare_scopes(
            &self.indicators,
            &resolved.indicator,
            &scopes,
            params.historica.unwrap_or(false),
        )
        .await;
        let rows: Vec<ComparisonRow> = outcomes
            .into_iter()
            .map(ComparisonRow::from_outcome)
            .collect();
        Ok(CallToolResult::success(vec![Content::json(rows)?]))
    }

    #[tool(
        description = "Lista los indicadores del catálogo curado con su categoría, unidad, periodicidad y niveles de cobertura."
    )]
    async fn listar_indicadores_disponibles(&self) -> Result<CallToolResult, ErrorData> {
        let entries: Vec<CatalogEntry> = CURATED_INDICATORS
            .iter()
            .map(|entry| CatalogEntry {
                categoria: entry.category.to_string(),
                indicator: entry.to_ref(),
            })
            .collect();
        Ok(CallToolResult::success(vec![Content::json(entries)?]))
    }
}

/// Maps the original area/code tool parameters onto a validated scope.
fn scope_from_params(area: Option<&str>, code: Option<&str>) -> ApiResult<GeoScope> {
    match area.unwrap_or("00") {
        "00" => Ok(GeoScope::national()),
        "99" => match code {
            Some(code) => GeoScope::state(code),
            None => Err(ApiError::InvalidParameter(
                "codigo_geo is required for state-level queries".to_string(),
            )),
        },
        "999" => match code {
            Some(code) => GeoScope::municipal(code),
            None => Err(ApiError::InvalidParameter(
                "codigo_geo is required for municipal-level queries".to_string(),
            )),
        },
        other => Err(ApiError::InvalidParameter(format!(
            "unknown area_geografica '{other}' (use 00, 99, or 999)"
        ))),
    }
}

//! MCP server implementation for the INEGI query tools.
//!
//! This crate wires the core clients into rmcp tool handlers and exposes the
//! MCP-facing surface: indicator search and time series on one side, the
//! business-registry searches and counts on the other.

mod helpers;
mod tools;
pub mod server;

use inegi_core::catalog::Resolver;
use inegi_core::denue::DenueClient;
use inegi_core::indicators::IndicadoresClient;
use inegi_core::transport::Transport;
use rmcp::{
    ErrorData,
    ServerHandler,
    handler::server::tool::ToolRouter,
    tool,
    tool_handler,
    tool_router,
};
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};

const SERVER_INSTRUCTIONS: &str = r"inegi-mcp provides MCP tools over two INEGI APIs: the BISE indicator bank and the DENUE business registry.

Workflow:
1. Find an indicator with `buscar_indicadores` (curated catalog with live fallback)
   or `buscar_catalogo_completo` (live catalog only). `listar_indicadores_disponibles`
   shows the curated catalog with units, cadence, and coverage.
2. Fetch data with `obtener_serie_temporal` (national by default; pass
   area_geografica '99'/'999' plus codigo_geo for a state or municipality) or
   rank states with `comparar_estados`.
3. Query businesses with `buscar_establecimientos` (free text, optionally an
   entidad scope or latitud/longitud/radio for a radius search),
   `buscar_area_act` (detailed state/municipality search with AGEB and manzana
   fields), `obtener_coordenadas_establecimientos` (coordinate extraction), and
   `cuantificar_establecimientos` (counts by activity code and area).

Notes:
- Indicator and state codes always come back with their human labels; reuse the
  codes in follow-up calls.
- State codes are the two-digit INEGI scheme ('01'..'32'); municipal codes are
  five digits (state + municipality).
- Empty result lists mean zero matches, not an error.
- `health` returns `ok`.";

/// MCP server wrapper around the two API clients and the catalog resolver.
pub struct InegiMcp<T: Transport> {
    tool_router: ToolRouter<Self>,
    indicators: IndicadoresClient<T>,
    resolver: Resolver<T>,
    denue: DenueClient<T>,
}

impl<T: Transport> Clone for InegiMcp<T> {
    fn clone(&self) -> Self {
        Self {
            tool_router: self.tool_router.clone(),
            indicators: self.indicators.clone(),
            resolver: self.resolver.clone(),
            denue: self.denue.clone(),
        }
    }
}

impl<T: Transport> InegiMcp<T> {
    /// Creates a new server over configured API clients.
    #[must_use]
    pub fn new(indicators: IndicadoresClient<T>, denue: DenueClient<T>) -> Self {
        let tool_router = Self::tool_router_core()
            + Self::tool_router_indicadores()
            + Self::tool_router_denue();
        Self {
            tool_router,
            resolver: Resolver::new(indicators.clone()),
            indicators,
            denue,
        }
    }
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl<T: Transport> InegiMcp<T> {
    #[tool(description = "Health check. Returns 'ok'.")]
    async fn health(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }
}

#[tool_handler]
impl<T: Transport> ServerHandler for InegiMcp<T> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}

//! Daemon entry point for the INEGI MCP server.
//!
//! Loads configuration from the environment, builds both API clients over a
//! shared HTTP transport, and serves the MCP protocol over stdio and/or
//! streamable HTTP.

mod config;

use std::sync::Arc;

use inegi_core::denue::DenueClient;
use inegi_core::indicators::IndicadoresClient;
use inegi_core::transport::HttpTransport;
use inegi_mcp::InegiMcp;
use inegi_mcp::server::{McpHttpServerConfig, serve_stdio, serve_streamable_http};

use crate::config::InegiConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = InegiConfig::from_args()?;
    let transport = Arc::new(HttpTransport::new(config.request_timeout));

    let indicators = IndicadoresClient::new(transport.clone(), config.indicadores_token.clone())
        .with_base_url(&config.indicadores_base_url)
        .with_language(&config.language);
    let denue =
        DenueClient::new(transport, config.denue_token.clone()).with_base_url(&config.denue_base_url);
    let service = InegiMcp::new(indicators, denue);

    let http_config = McpHttpServerConfig::new(config.mcp_http_addr);
    if config.enable_stdio {
        if config.mcp_http_serve {
            let http_service = service.clone();
            tokio::spawn(async move {
                if let Err(err) = serve_streamable_http(http_service, http_config).await {
                    eprintln!("mcp http server error: {err}");
                }
            });
        }
        serve_stdio(service).await?;
    } else {
        serve_streamable_http(service, http_config).await?;
    }
    Ok(())
}

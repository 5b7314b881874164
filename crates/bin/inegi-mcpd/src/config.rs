use clap::{Parser, builder::BoolishValueParser};
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use inegi_core::denue::DENUE_BASE_URL;
use inegi_core::indicators::INDICADORES_BASE_URL;

const DEFAULT_MCP_HTTP_ADDR: &str = "127.0.0.1:4020";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LANGUAGE: &str = "es";

#[derive(Parser, Debug)]
#[command(name = "inegi-mcpd", version, about = "INEGI MCP daemon.")]
struct CliArgs {
    #[arg(long, env = "INEGI_INDICADORES_TOKEN")]
    indicadores_token: Option<String>,

    #[arg(long, env = "INEGI_DENUE_TOKEN")]
    denue_token: Option<String>,

    #[arg(
        long,
        env = "INEGI_INDICADORES_BASE_URL",
        default_value = INDICADORES_BASE_URL
    )]
    indicadores_base_url: String,

    #[arg(long, env = "INEGI_DENUE_BASE_URL", default_value = DENUE_BASE_URL)]
    denue_base_url: String,

    #[arg(
        long,
        env = "INEGI_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    timeout_secs: u64,

    #[arg(long, env = "INEGI_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
    language: String,

    #[arg(
        long = "stdio",
        env = "INEGI_ENABLE_STDIO",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    enable_stdio: bool,

    #[arg(
        long,
        env = "INEGI_MCP_HTTP_SERVE",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    mcp_http_serve: bool,

    #[arg(long, env = "INEGI_MCP_HTTP_ADDR", default_value = DEFAULT_MCP_HTTP_ADDR)]
    mcp_http_addr: SocketAddr,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
///
/// The tokens stay optional here: a missing credential fails at first use of
/// the corresponding API with a clear error, not at startup, so the server
/// can still serve the other API.
#[derive(Clone)]
pub struct InegiConfig {
    pub indicadores_token: Option<String>,
    pub denue_token: Option<String>,
    pub indicadores_base_url: String,
    pub denue_base_url: String,
    pub request_timeout: Duration,
    pub language: String,
    pub enable_stdio: bool,
    pub mcp_http_serve: bool,
    pub mcp_http_addr: SocketAddr,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidSetting { name: &'static str, value: String },
    NoTransportEnabled,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
            Self::NoTransportEnabled => {
                write!(f, "enable at least one of --stdio or --mcp-http-serve")
            }
        }
    }
}

impl Error for ConfigError {}

impl InegiConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }
}

impl TryFrom<CliArgs> for InegiConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "INEGI_TIMEOUT_SECS",
                value: args.timeout_secs.to_string(),
            });
        }
        if args.language.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "INEGI_LANGUAGE",
                value: args.language,
            });
        }
        if !args.enable_stdio && !args.mcp_http_serve {
            return Err(ConfigError::NoTransportEnabled);
        }

        let indicadores_token = args.indicadores_token.filter(|value| !value.trim().is_empty());
        let denue_token = args.denue_token.filter(|value| !value.trim().is_empty());

        Ok(Self {
            indicadores_token,
            denue_token,
            indicadores_base_url: args.indicadores_base_url,
            denue_base_url: args.denue_base_url,
            request_timeout: Duration::from_secs(args.timeout_secs),
            language: args.language,
            enable_stdio: args.enable_stdio,
            mcp_http_serve: args.mcp_http_serve,
            mcp_http_addr: args.mcp_http_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            indicadores_token: Some("indicadores-token".to_string()),
            denue_token: Some("denue-token".to_string()),
            indicadores_base_url: INDICADORES_BASE_URL.to_string(),
            denue_base_url: DENUE_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            language: DEFAULT_LANGUAGE.to_string(),
            enable_stdio: true,
            mcp_http_serve: false,
            mcp_http_addr: DEFAULT_MCP_HTTP_ADDR.parse().expect("valid MCP addr"),
        }
    }

    #[test]
    fn blank_tokens_become_absent_credentials() {
        let mut args = base_args();
        args.indicadores_token = Some("   ".to_string());
        args.denue_token = None;

        let config = InegiConfig::try_from(args).expect("config should parse");

        assert!(config.indicadores_token.is_none());
        assert!(config.denue_token.is_none());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut args = base_args();
        args.timeout_secs = 0;

        assert!(matches!(
            InegiConfig::try_from(args),
            Err(ConfigError::InvalidSetting { name: "INEGI_TIMEOUT_SECS", .. })
        ));
    }

    #[test]
    fn at_least_one_transport_is_required() {
        let mut args = base_args();
        args.enable_stdio = false;
        args.mcp_http_serve = false;

        assert!(matches!(
            InegiConfig::try_from(args),
            Err(ConfigError::NoTransportEnabled)
        ));
    }
}

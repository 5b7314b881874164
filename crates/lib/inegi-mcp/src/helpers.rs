use std::borrow::Cow;

use inegi_core::error::ApiError;
use rmcp::ErrorData;
use rmcp::model::ErrorCode;

pub(crate) fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

/// Maps the core error taxonomy onto MCP error codes, keeping the
/// human-readable description intact.
pub(crate) fn map_err(err: ApiError) -> ErrorData {
    let code = match &err {
        ApiError::NotFound(_) => ErrorCode::RESOURCE_NOT_FOUND,
        ApiError::InvalidParameter(_) | ApiError::UnsupportedScope { .. } => {
            ErrorCode::INVALID_PARAMS
        }
        ApiError::MissingCredential(_)
        | ApiError::AuthFailure(_)
        | ApiError::RateLimited(_)
        | ApiError::UpstreamTimeout(_)
        | ApiError::UpstreamUnavailable(_)
        | ApiError::MalformedResponse(_) => ErrorCode::INTERNAL_ERROR,
    };
    mcp_err(code, err.to_string())
}

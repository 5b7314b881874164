//! Cross-scope comparison of one indicator.
//!
//! Fetches run concurrently, but the returned entries always follow the
//! input scope order: callers build ranked tables by position. One scope's
//! failure is captured on its own entry instead of failing the batch, since
//! some indicator/scope combinations legitimately lack data.

use futures::future;

use crate::catalog::entity_name;
use crate::error::ApiResult;
use crate::indicators::IndicadoresClient;
use crate::model::{GeoScope, IndicatorRef, TimeSeries};
use crate::transport::Transport;

/// The outcome for one scope in a comparison batch.
#[derive(Debug)]
pub struct ScopeOutcome {
    pub scope: GeoScope,
    pub entity: Option<&'static str>,
    pub series: ApiResult<TimeSeries>,
}

/// Fetches `indicator` for every scope in `scopes`, concurrently, returning
/// one outcome per scope in the same order as the input.
pub async fn compare_scopes<T: Transport>(
    client: &IndicadoresClient<T>,
    indicator: &IndicatorRef,
    scopes: &[GeoScope],
    historical: bool,
) -> Vec<ScopeOutcome> {
    let fetches = scopes.iter().map(|scope| async move {
        ScopeOutcome {
            scope: scope.clone(),
            entity: scope.entity_code().and_then(entity_name),
            series: client.fetch(indicator, scope, historical).await,
        }
    });
    future::join_all(fetches).await
}

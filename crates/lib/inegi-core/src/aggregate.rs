//! Establishment counting by sector and area.
//!
//! Counting always exhausts the search pages instead of trusting a reported
//! total blindly: the registry's totals are sometimes unknown or stale. When
//! a reported total is obtainable it is cross-checked against the exhausted
//! count, and a disagreement surfaces as a warning, never as a failure.

use tracing::debug;

use crate::denue::DenueClient;
use crate::error::ApiResult;
use crate::model::{GeoScope, SectorCount, SectorCountReport};
use crate::transport::Transport;

/// Page budget used to exhaust a result set before counting.
const EXHAUST_LIMIT: usize = 10_000;

/// Counts establishments for one activity code within a geographic scope.
///
/// # Errors
/// `InvalidParameter` for a malformed activity code, `MissingCredential`
/// without a token, or any transport failure from the search. A failing
/// reported-total lookup degrades to "unknown" instead of failing the count.
pub async fn count_by_sector<T: Transport>(
    client: &DenueClient<T>,
    activity_code: &str,
    scope: &GeoScope,
) -> ApiResult<SectorCountReport> {
    let page = client
        .search_by_activity_and_area(activity_code, scope, EXHAUST_LIMIT)
        .await?;
    let counted = page.items.len() as u64;
    let mut warning = None;
    if page.has_more {
        warning = Some(format!(
            "count stopped at {counted} establishments; upstream reports further pages"
        ));
    }

    let reported_total = match client.quantify(activity_code, scope, None).await {
        Ok(rows) => Some(rows.iter().map(|row| row.total).sum::<u64>()),
        Err(err) => {
            debug!(activity = activity_code, error = %err, "reported-total lookup failed");
            None
        }
    };
    if warning.is_none() {
        if let Some(total) = reported_total {
            if total != counted {
                warning = Some(format!(
                    "upstream reports {total} establishments but {counted} were counted"
                ));
            }
        }
    }

    Ok(SectorCountReport {
        count: SectorCount {
            sector_code: activity_code.to_string(),
            area: scope.clone(),
            count: counted,
        },
        reported_total,
        warning,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::error::ApiResult;
    use crate::transport::{ApiRequest, Transport};

    struct ScriptedRegistry {
        reported_total: u64,
    }

    #[async_trait]
    impl Transport for ScriptedRegistry {
        async fn get_json(&self, request: &ApiRequest) -> ApiResult<Value> {
            let url = request.url();
            if url.contains("/Cuantificar/") {
                return Ok(json!([
                    {"AE": "462112", "AG": "31", "Total": self.reported_total.to_string()}
                ]));
            }
            Ok(json!([
                {"Id": "1", "Nombre": "MINISUPER UNO", "Clase_actividad": "Minisupers"},
                {"Id": "2", "Nombre": "MINISUPER DOS", "Clase_actividad": "Minisupers"},
                {"Id": "3", "Nombre": "MINISUPER TRES", "Clase_actividad": "Minisupers"},
            ]))
        }
    }

    fn client(reported_total: u64) -> DenueClient<ScriptedRegistry> {
        DenueClient::new(
            Arc::new(ScriptedRegistry { reported_total }),
            Some("T".to_string()),
        )
    }

    #[tokio::test]
    async fn agreeing_totals_produce_no_warning() {
        let scope = GeoScope::state("31").expect("valid code");
        let report = count_by_sector(&client(3), "462112", &scope)
            .await
            .expect("count succeeds");
        assert_eq!(report.count.count, 3);
        assert_eq!(report.reported_total, Some(3));
        assert!(report.warning.is_none());
    }

    #[tokio::test]
    async fn disagreeing_totals_warn_without_failing() {
        let scope = GeoScope::state("31").expect("valid code");
        let report = count_by_sector(&client(5), "462112", &scope)
            .await
            .expect("count succeeds");
        assert_eq!(report.count.count, 3);
        assert_eq!(report.reported_total, Some(5));
        let warning = report.warning.expect("mismatch warning");
        assert!(warning.contains('5'));
        assert!(warning.contains('3'));
    }
}

mod common;

use std::sync::Arc;

use serde_json::{Value, json};

use common::{MockTransport, window_bounds};
use inegi_core::aggregate::count_by_sector;
use inegi_core::denue::{AreaQuery, DenueClient, MAX_PAGE_SIZE, MAX_RADIUS_METERS};
use inegi_core::error::{ApiError, ApiResult};
use inegi_core::model::GeoScope;

fn client(transport: Arc<MockTransport>) -> DenueClient<MockTransport> {
    DenueClient::new(transport, Some("TEST-TOKEN".to_string()))
        .with_base_url("https://denue.mock.test/consulta")
}

fn establishment_rows(start: usize, end: usize) -> Value {
    let rows: Vec<Value> = (start..=end)
        .map(|index| {
            json!({
                "Id": index.to_string(),
                "Nombre": format!("ESTABLECIMIENTO {index}"),
                "Clase_actividad": "Comercio al por menor",
                "Latitud": "20.9673702",
                "Longitud": "-89.6245316"
            })
        })
        .collect();
    Value::Array(rows)
}

/// Serves a fixture of `total` records through windowed requests.
fn windowed_fixture(total: usize, anchor: &'static str, offset: usize) -> impl Fn(&str) -> ApiResult<Value> {
    move |url: &str| {
        let (start, end) = window_bounds(url, anchor, offset);
        if start > total {
            return Ok(Value::Array(Vec::new()));
        }
        Ok(establishment_rows(start, end.min(total)))
    }
}

#[tokio::test]
async fn paged_search_stays_within_the_request_budget() {
    let transport = Arc::new(
        MockTransport::new().with_handler("/BuscarEntidad/", windowed_fixture(450, "BuscarEntidad", 3)),
    );
    let scope = GeoScope::state("31").expect("valid code");
    let limit = 500;

    let page = client(transport.clone())
        .search_by_term("todos", Some(&scope), limit)
        .await
        .expect("search succeeds");

    let budget = limit.div_ceil(MAX_PAGE_SIZE);
    assert!(transport.call_count() <= budget);
    assert_eq!(page.items.len(), 450);
    assert_eq!(page.total_available, Some(450));
    assert!(!page.has_more);
}

#[tokio::test]
async fn paged_search_stops_at_the_limit_and_reports_more() {
    let transport = Arc::new(
        MockTransport::new().with_handler("/BuscarEntidad/", windowed_fixture(450, "BuscarEntidad", 3)),
    );
    let scope = GeoScope::state("31").expect("valid code");

    let page = client(transport.clone())
        .search_by_term("todos", Some(&scope), 300)
        .await
        .expect("search succeeds");

    assert_eq!(transport.call_count(), 2);
    assert_eq!(page.items.len(), 300);
    assert_eq!(page.total_available, None);
    assert!(page.has_more);

    let (start, end) = window_bounds(&transport.calls()[1], "BuscarEntidad", 3);
    assert_eq!((start, end), (201, 300));
}

#[tokio::test]
async fn out_of_bound_radius_records_no_upstream_call() {
    let transport = Arc::new(MockTransport::new());

    let err = client(transport.clone())
        .search_by_radius("cafe", 20.97, -89.62, MAX_RADIUS_METERS + 1, 500)
        .await
        .expect_err("radius beyond the documented maximum");

    assert!(matches!(err, ApiError::InvalidParameter(_)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn radius_search_truncates_to_the_limit() {
    let transport = Arc::new(
        MockTransport::new().with_handler("/Buscar/", |_| Ok(establishment_rows(1, 40))),
    );

    let page = client(transport.clone())
        .search_by_radius("cafe", 20.97, -89.62, 250, 25)
        .await
        .expect("search succeeds");

    assert_eq!(transport.call_count(), 1);
    assert_eq!(page.items.len(), 25);
    assert_eq!(page.total_available, Some(40));
    assert!(page.has_more);
}

#[tokio::test]
async fn zero_match_404_is_an_empty_page_not_a_failure() {
    let transport = Arc::new(MockTransport::new().with_error("/Buscar/", || {
        ApiError::NotFound("upstream has no resource for this request (HTTP 404)".to_string())
    }));

    let page = client(transport)
        .search_by_term("zzzqqq123", None, 10)
        .await
        .expect("empty result is valid");

    assert!(page.items.is_empty());
    assert_eq!(page.total_available, Some(0));
    assert!(!page.has_more);
}

#[tokio::test]
async fn area_search_routes_the_class_code_and_keeps_geo_fields() {
    let transport = Arc::new(MockTransport::new().with_json(
        "/BuscarAreaAct/31/050/",
        json!([{
            "Id": "7",
            "Nombre": "MINISUPER EL CENTRO",
            "CLASE_ACTIVIDAD_ID": "462112",
            "Clase_actividad": "Comercio al por menor en minisupers",
            "Calle": "CALLE 60",
            "Num_Exterior": "491",
            "Colonia": "CENTRO",
            "CP": "97000",
            "AGEB": "2000",
            "Manzana": "043",
            "Latitud": "20.9673702",
            "Longitud": "-89.6245316"
        }]),
    ));
    let query = AreaQuery {
        scope: GeoScope::municipal("31050").expect("valid code"),
        activity_code: Some("462112".to_string()),
        name: None,
    };

    let page = client(transport.clone())
        .search_area(&query, 10)
        .await
        .expect("search succeeds");

    assert_eq!(page.items.len(), 1);
    let found = &page.items[0];
    assert_eq!(found.activity_code, "462112");
    assert_eq!(found.ageb.as_deref(), Some("2000"));
    assert_eq!(found.manzana.as_deref(), Some("043"));

    let url = &transport.calls()[0];
    // Class codes land in the clase slot, not sector/subsector/rama.
    assert!(url.contains("/BuscarAreaAct/31/050/0/0/0/0/0/0/462112/0/1/10/0/TEST-TOKEN"));
}

#[tokio::test]
async fn malformed_activity_code_fails_before_any_call() {
    let transport = Arc::new(MockTransport::new());
    let scope = GeoScope::state("31").expect("valid code");

    let err = client(transport.clone())
        .search_by_activity_and_area("46211", &scope, 10)
        .await
        .expect_err("five-digit codes have no slot");

    assert!(matches!(err, ApiError::InvalidParameter(_)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn sector_count_matches_the_fixture() {
    let transport = Arc::new(
        MockTransport::new()
            .with_json("/BuscarAreaAct/", establishment_rows(1, 3))
            .with_json(
                "/Cuantificar/462112/31/",
                json!([{"AE": "462112", "AG": "31", "Total": "3"}]),
            ),
    );
    let scope = GeoScope::state("31").expect("valid code");

    let report = count_by_sector(&client(transport), "462112", &scope)
        .await
        .expect("count succeeds");

    assert_eq!(report.count.count, 3);
    assert_eq!(report.count.sector_code, "462112");
    assert_eq!(report.reported_total, Some(3));
    assert!(report.warning.is_none());
}

#[tokio::test]
async fn sector_count_warns_when_the_reported_total_disagrees() {
    let transport = Arc::new(
        MockTransport::new()
            .with_json("/BuscarAreaAct/", establishment_rows(1, 3))
            .with_json(
                "/Cuantificar/462112/31/",
                json!([{"AE": "462112", "AG": "31", "Total": "7"}]),
            ),
    );
    let scope = GeoScope::state("31").expect("valid code");

    let report = count_by_sector(&client(transport), "462112", &scope)
        .await
        .expect("count succeeds despite the mismatch");

    assert_eq!(report.count.count, 3);
    assert_eq!(report.reported_total, Some(7));
    assert!(report.warning.is_some());
}

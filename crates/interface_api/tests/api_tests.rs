//! HTTP API tests
//!
//! Drive the router end to end over the in-memory store.

use axum::http::StatusCode;
use axum_test::TestServer;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use core_kernel::TenantId;
use domain_ledger::{JournalVoucher, TrialBalance};
use domain_production::{
    BillOfMaterials, CostEstimate, CostReconciliation, Material, ProductionOrderStatus,
};
use interface_api::config::ApiConfig;
use interface_api::create_router;
use interface_api::dto::ledger::PostJournalEntryResponse;
use interface_api::dto::production::{CreateOrderResponse, OrderStatusResponse};
use test_utils::{fixtures, InMemoryStore};

fn server_for(store: InMemoryStore) -> TestServer {
    TestServer::new(create_router(store, ApiConfig::default())).unwrap()
}

fn tenant_server() -> (TestServer, TenantId) {
    let tenant_id = TenantId::new();
    (server_for(fixtures::manufacturing_store(tenant_id)), tenant_id)
}

mod health_tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_endpoints() {
        let (server, _) = tenant_server();

        server.get("/health").await.assert_status_ok();
        let ready = server.get("/health/ready").await;
        ready.assert_status_ok();
        assert_eq!(ready.json::<Value>()["status"], "ready");
    }

    #[tokio::test]
    async fn test_router_serves_without_test_server() {
        let app = create_router(InMemoryStore::new(), ApiConfig::default());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

mod journal_tests {
    use super::*;

    fn entry(tenant_id: TenantId, lines: Value) -> Value {
        json!({
            "tenant_id": tenant_id,
            "actor_id": "accountant",
            "source": "Manual",
            "narration": "Owner contribution",
            "reference_id": "DEP-1",
            "entry_date": "2024-03-01",
            "lines": lines,
        })
    }

    #[tokio::test]
    async fn test_post_split_entry_and_read_voucher() {
        let (server, tenant_id) = tenant_server();

        let response = server
            .post("/api/v1/journal-entries")
            .add_header("x-actor-id", "accountant")
            .json(&entry(
                tenant_id,
                json!([
                    {"account": {"role": "CASH"}, "side": "debit", "amount": "100.00"},
                    {"account": {"code": "3000"}, "side": "credit", "amount": "60.00"},
                    {"account": {"code": "2000"}, "side": "credit", "amount": "40.00"},
                ]),
            ))
            .await;
        response.assert_status(StatusCode::CREATED);
        let posted = response.json::<PostJournalEntryResponse>();
        assert!(posted.voucher_number.starts_with("JV-20240301-"));
        assert_eq!(posted.total, dec!(100.00));

        let voucher = server
            .get(&format!("/api/v1/vouchers/{}", posted.voucher_id))
            .add_query_param("tenant_id", tenant_id)
            .await;
        voucher.assert_status_ok();
        let voucher = voucher.json::<JournalVoucher>();
        assert_eq!(voucher.lines.len(), 3);
        assert_eq!(voucher.lines[0].account_code, "1000");
        assert!(voucher.is_balanced());
    }

    #[tokio::test]
    async fn test_unbalanced_entry_is_unprocessable() {
        let (server, tenant_id) = tenant_server();

        let response = server
            .post("/api/v1/journal-entries")
            .json(&entry(
                tenant_id,
                json!([
                    {"account": {"code": "1000"}, "side": "debit", "amount": "100"},
                    {"account": {"code": "3000"}, "side": "credit", "amount": "99"},
                ]),
            ))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_unknown_role_is_rejected_at_deserialisation() {
        let (server, tenant_id) = tenant_server();

        let response = server
            .post("/api/v1/journal-entries")
            .json(&entry(
                tenant_id,
                json!([
                    {"account": {"role": "PETTY_CASH"}, "side": "debit", "amount": "10"},
                    {"account": {"code": "3000"}, "side": "credit", "amount": "10"},
                ]),
            ))
            .expect_failure()
            .await;

        assert!(response.status_code().is_client_error());
    }

    #[tokio::test]
    async fn test_unconfigured_role_is_not_found() {
        let tenant_id = TenantId::new();
        let server = server_for(InMemoryStore::new());

        let response = server
            .post("/api/v1/journal-entries")
            .json(&entry(
                tenant_id,
                json!([
                    {"account": {"role": "CASH"}, "side": "debit", "amount": "10"},
                    {"account": {"role": "RETAINED_EARNINGS"}, "side": "credit", "amount": "10"},
                ]),
            ))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_register_accounts_then_post() {
        let tenant_id = TenantId::new();
        let server = server_for(InMemoryStore::new());

        server
            .post("/api/v1/accounts")
            .json(&json!({
                "tenant_id": tenant_id,
                "accounts": [
                    {"code": "1000", "name": "Cash", "class": "asset", "system_role": "CASH"},
                    {"code": "3000", "name": "Capital", "class": "equity"},
                ],
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let duplicate = server
            .post("/api/v1/accounts")
            .json(&json!({
                "tenant_id": tenant_id,
                "accounts": [{"code": "1000", "name": "Cash again", "class": "asset"}],
            }))
            .await;
        duplicate.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        server
            .post("/api/v1/journal-entries")
            .json(&entry(
                tenant_id,
                json!([
                    {"account": {"role": "CASH"}, "side": "debit", "amount": "25"},
                    {"account": {"code": "3000"}, "side": "credit", "amount": "25"},
                ]),
            ))
            .await
            .assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_ledger_activity_and_invalid_period() {
        let (server, tenant_id) = tenant_server();

        for (date, amount) in [("2024-01-15", "70"), ("2024-02-10", "30")] {
            let mut body = entry(
                tenant_id,
                json!([
                    {"account": {"code": "1000"}, "side": "debit", "amount": amount},
                    {"account": {"code": "3000"}, "side": "credit", "amount": amount},
                ]),
            );
            body["entry_date"] = json!(date);
            server.post("/api/v1/journal-entries").json(&body).await.assert_status(StatusCode::CREATED);
        }

        let activity = server
            .get("/api/v1/ledger/1000")
            .add_query_param("tenant_id", tenant_id)
            .add_query_param("from", "2024-02-01")
            .add_query_param("to", "2024-02-29")
            .await;
        activity.assert_status_ok();
        let activity = activity.json::<Value>();
        assert_eq!(activity["lines"].as_array().unwrap().len(), 1);
        assert_eq!(activity["natural_side"], "debit");

        server
            .get("/api/v1/ledger/1000")
            .add_query_param("tenant_id", tenant_id)
            .add_query_param("from", "2024-03-01")
            .add_query_param("to", "2024-02-01")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        server
            .get("/api/v1/ledger/9999")
            .add_query_param("tenant_id", tenant_id)
            .add_query_param("from", "2024-01-01")
            .add_query_param("to", "2024-12-31")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod production_tests {
    use super::*;

    async fn seed_bom(server: &TestServer, tenant_id: TenantId) -> BillOfMaterials {
        let steel = server
            .post("/api/v1/materials")
            .json(&json!({
                "tenant_id": tenant_id,
                "sku": "RM-STEEL",
                "name": "Steel sheet",
                "uom": "kg",
                "average_unit_cost": "5.00",
            }))
            .await;
        steel.assert_status(StatusCode::CREATED);
        let steel = steel.json::<Material>();

        let widget = server
            .post("/api/v1/materials")
            .json(&json!({"tenant_id": tenant_id, "sku": "FG-WIDGET", "name": "Widget", "uom": "ea"}))
            .await
            .json::<Material>();

        let bom = server
            .post("/api/v1/boms")
            .json(&json!({
                "tenant_id": tenant_id,
                "finished_good": widget.id,
                "version": 1,
                "batch_size": "10",
                "scrap_percentage": "5",
                "components": [{"material_id": steel.id, "quantity": "2", "uom": "kg"}],
                "overheads": [{
                    "name": "Factory overhead",
                    "category": "factory",
                    "allocation": "percentage_of_material",
                    "cost": "10",
                    "gl_account": "5100",
                }],
                "operations": [{"sequence": 10, "name": "Cut", "notes": null}],
            }))
            .await;
        bom.assert_status(StatusCode::CREATED);
        bom.json::<BillOfMaterials>()
    }

    async fn set_status(
        server: &TestServer,
        tenant_id: TenantId,
        order_id: uuid::Uuid,
        status: &str,
    ) -> axum_test::TestResponse {
        server
            .put(&format!("/api/v1/production-orders/{}/status", order_id))
            .json(&json!({"tenant_id": tenant_id, "actor_id": "supervisor", "status": status}))
            .await
    }

    #[tokio::test]
    async fn test_cost_estimate_matches_worked_example() {
        let (server, tenant_id) = tenant_server();
        let bom = seed_bom(&server, tenant_id).await;

        let estimate = server
            .get(&format!("/api/v1/boms/{}/cost-estimate", bom.id.as_uuid()))
            .add_query_param("tenant_id", tenant_id)
            .add_query_param("quantity", "10")
            .await;
        estimate.assert_status_ok();
        let estimate = estimate.json::<CostEstimate>();

        assert_eq!(estimate.final_unit_cost, dec!(11.55));
        assert_eq!(estimate.total, dec!(115.50));

        server
            .get(&format!("/api/v1/boms/{}/cost-estimate", bom.id.as_uuid()))
            .add_query_param("tenant_id", tenant_id)
            .add_query_param("quantity", "0")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        // Beyond the decimal range once multiplied out
        server
            .get(&format!("/api/v1/boms/{}/cost-estimate", bom.id.as_uuid()))
            .add_query_param("tenant_id", tenant_id)
            .add_query_param("quantity", "39614081257132168796771975167")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_order_lifecycle_posts_completion_voucher() {
        let (server, tenant_id) = tenant_server();
        let bom = seed_bom(&server, tenant_id).await;

        let created = server
            .post("/api/v1/production-orders")
            .json(&json!({
                "tenant_id": tenant_id,
                "actor_id": "planner",
                "bom_id": bom.id,
                "quantity": "10",
                "notes": "First run",
            }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let created = created.json::<CreateOrderResponse>();
        assert_eq!(created.status, ProductionOrderStatus::Pending);

        set_status(&server, tenant_id, created.order_id, "Completed")
            .await
            .assert_status(StatusCode::CONFLICT);
        set_status(&server, tenant_id, created.order_id, "InProgress")
            .await
            .assert_status_ok();

        let completed = set_status(&server, tenant_id, created.order_id, "Completed").await;
        completed.assert_status_ok();
        let completed = completed.json::<OrderStatusResponse>();
        assert_eq!(completed.status, ProductionOrderStatus::Completed);
        let voucher_id = completed.completion_voucher_id.unwrap();

        set_status(&server, tenant_id, created.order_id, "Completed")
            .await
            .assert_status(StatusCode::CONFLICT);

        let voucher = server
            .get(&format!("/api/v1/vouchers/{}", voucher_id))
            .add_query_param("tenant_id", tenant_id)
            .await
            .json::<JournalVoucher>();
        assert_eq!(voucher.total_debit, dec!(110.00));
        assert!(voucher.is_balanced());

        let reconciliation = server
            .get(&format!("/api/v1/production-orders/{}/reconciliation", created.order_id))
            .add_query_param("tenant_id", tenant_id)
            .await
            .json::<CostReconciliation>();
        assert_eq!(reconciliation.planned.total, dec!(115.50));
        assert_eq!(reconciliation.actual.unwrap().total, dec!(110.00));
        assert_eq!(reconciliation.variance.unwrap().total, dec!(-5.50));

        let report = server
            .get("/api/v1/trial-balance")
            .add_query_param("tenant_id", tenant_id)
            .add_query_param("from", "2000-01-01")
            .add_query_param("to", "2100-12-31")
            .await
            .json::<TrialBalance>();
        assert!(report.is_balanced);
        assert_eq!(report.total_debits, dec!(110.00));
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let (server, tenant_id) = tenant_server();

        server
            .get(&format!("/api/v1/production-orders/{}", uuid::Uuid::new_v4()))
            .add_query_param("tenant_id", tenant_id)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

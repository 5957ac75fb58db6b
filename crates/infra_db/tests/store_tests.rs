//! PostgreSQL store tests
//!
//! These run against a disposable Postgres container and are ignored by
//! default. Run with `cargo test -p infra_db -- --ignored`.

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::{AdapterHealth, Currency, HealthCheckable, TenantId, UnitOfWork};
use domain_ledger::{
    AccountDirectory, JournalEntryRequest, JournalPostingService, LedgerError,
    LedgerQueryService, LedgerSession, LedgerStore, ManufacturingChartOfAccounts, SystemRole,
    VoucherSource,
};
use domain_production::{
    AllocationMethod, BillOfMaterials, BomCatalog, Material, ProductionError,
    ProductionOrderService, ProductionOrderStatus,
};
use infra_db::PgStore;
use test_utils::get_shared_test_database;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn seeded_store() -> (PgStore, TenantId) {
    let db = get_shared_test_database().await;
    let store = db.store();
    let tenant_id = TenantId::new();

    let mut session = store.begin().await.unwrap();
    AccountDirectory::register(
        &mut session,
        tenant_id,
        &ManufacturingChartOfAccounts::standard_accounts(tenant_id),
    )
    .await
    .unwrap();
    session.commit().await.unwrap();

    (store, tenant_id)
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_health_check_reports_healthy() {
    let db = get_shared_test_database().await;
    let result = db.store().health_check().await;

    assert_eq!(result.status, AdapterHealth::Healthy);
    assert_eq!(result.adapter_id, "postgres-store");
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_role_lookup_uses_active_account() {
    let (store, tenant_id) = seeded_store().await;

    let mut session = store.begin().await.unwrap();
    let account = AccountDirectory::resolve(&mut session, tenant_id, SystemRole::InventoryRawMaterial)
        .await
        .unwrap();
    assert_eq!(account.code, "1200");
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_dropped_session_rolls_back() {
    let (store, tenant_id) = seeded_store().await;

    {
        let mut session = store.begin().await.unwrap();
        let accounts = ManufacturingChartOfAccounts::standard_accounts(TenantId::new());
        let mut extra = accounts[0].clone();
        extra.tenant_id = tenant_id;
        extra.code = "1999".to_string();
        extra.system_role = None;
        session.insert_account(&extra).await.unwrap();
        // dropped without commit
    }

    let mut session = store.begin().await.unwrap();
    assert!(session.find_account(tenant_id, "1999").await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_posted_voucher_reads_back_with_number() {
    let (store, tenant_id) = seeded_store().await;
    let posting = JournalPostingService::new(store.clone(), Currency::USD);

    let request = JournalEntryRequest::new(tenant_id, "tester", VoucherSource::Purchase, "Steel receipt")
        .dated(date(2024, 3, 15))
        .debit(SystemRole::InventoryRawMaterial, dec!(250.00))
        .credit("2000", dec!(250.00));
    let posted = posting.post(request).await.unwrap();

    assert!(posted.voucher_number.starts_with("JV-20240315-"));

    let voucher = posting.get_voucher(tenant_id, posted.voucher_id).await.unwrap();
    assert!(voucher.is_balanced());
    assert_eq!(voucher.lines.len(), 2);
    assert_eq!(voucher.lines[0].account_code, "1200");
    assert_eq!(voucher.total_debit, dec!(250.00));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_unknown_account_leaves_no_voucher() {
    let (store, tenant_id) = seeded_store().await;
    let posting = JournalPostingService::new(store.clone(), Currency::USD);

    let request = JournalEntryRequest::new(tenant_id, "tester", VoucherSource::Manual, "Bad")
        .debit("9999", dec!(10))
        .credit("2000", dec!(10));
    let result = posting.post(request).await;
    assert!(matches!(result, Err(LedgerError::AccountNotFound(_))));

    let query = LedgerQueryService::new(store);
    let report = query
        .trial_balance(tenant_id, date(2000, 1, 1), date(2100, 1, 1))
        .await
        .unwrap();
    assert!(report.entries.is_empty());
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_account_activity_windows() {
    let (store, tenant_id) = seeded_store().await;
    let posting = JournalPostingService::new(store.clone(), Currency::USD);

    for (day, amount) in [(date(2024, 1, 31), dec!(100)), (date(2024, 2, 1), dec!(40)), (date(2024, 2, 29), dec!(10))] {
        let request = JournalEntryRequest::new(tenant_id, "tester", VoucherSource::Manual, "Cash sale")
            .dated(day)
            .debit("1000", amount)
            .credit("4000", amount);
        posting.post(request).await.unwrap();
    }

    let query = LedgerQueryService::new(store);
    let activity = query
        .account_activity(tenant_id, "1000", date(2024, 2, 1), date(2024, 2, 29))
        .await
        .unwrap();

    assert_eq!(activity.opening_balance, dec!(100));
    assert_eq!(activity.lines.len(), 2);
    assert_eq!(activity.total_debit, dec!(50));
    assert_eq!(activity.closing_balance, dec!(150));

    let report = query
        .trial_balance(tenant_id, date(2024, 2, 1), date(2024, 2, 29))
        .await
        .unwrap();
    let cash = report.entries.iter().find(|e| e.account_code == "1000").unwrap();
    let revenue = report.entries.iter().find(|e| e.account_code == "4000").unwrap();
    assert_eq!(cash.debit, dec!(150));
    assert_eq!(revenue.credit, dec!(50));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_production_completion_is_serialised() {
    let (store, tenant_id) = seeded_store().await;
    let catalog = BomCatalog::new(store.clone());

    let steel = catalog
        .register_material(Material::new(tenant_id, "RM-STEEL", "Steel sheet", "kg", dec!(5.00)))
        .await
        .unwrap();
    let widget = catalog
        .register_material(Material::new(tenant_id, "FG-WIDGET", "Widget", "ea", dec!(0)))
        .await
        .unwrap();
    let bom = catalog
        .register_bom(
            BillOfMaterials::new(tenant_id, widget.id, 1)
                .with_batch_size(dec!(10))
                .with_scrap(dec!(5))
                .component(steel.id, dec!(2), "kg")
                .overhead("Factory overhead", "factory", AllocationMethod::PerUnit, dec!(1.00), "5100")
                .operation(10, "Cut", None),
        )
        .await
        .unwrap();

    let loaded = catalog.get_bom(tenant_id, bom.id).await.unwrap();
    assert_eq!(loaded.components.len(), 1);
    assert_eq!(loaded.overheads[0].allocation, AllocationMethod::PerUnit);

    let orders = ProductionOrderService::new(store.clone(), Currency::USD);
    let order = orders.create(tenant_id, "planner", bom.id, dec!(10), None).await.unwrap();
    orders
        .advance(tenant_id, "planner", order.id, ProductionOrderStatus::InProgress)
        .await
        .unwrap();

    let first = {
        let orders = orders.clone();
        tokio::spawn(async move {
            orders
                .advance(tenant_id, "line-a", order.id, ProductionOrderStatus::Completed)
                .await
        })
    };
    let second = {
        let orders = orders.clone();
        tokio::spawn(async move {
            orders
                .advance(tenant_id, "line-b", order.id, ProductionOrderStatus::Completed)
                .await
        })
    };
    let results = [first.await.unwrap(), second.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(ProductionError::InvalidTransition { .. }))));

    let details = orders.get_order(tenant_id, order.id).await.unwrap();
    assert_eq!(details.order.status, ProductionOrderStatus::Completed);
    assert_eq!(details.consumptions.len(), 1);
    assert!(details.order.completion_voucher_id.is_some());

    let reconciliation = orders.reconcile(tenant_id, order.id).await.unwrap();
    let actual = reconciliation.actual.unwrap();
    assert_eq!(actual.material, dec!(100.00));
    assert_eq!(actual.overhead, dec!(10.00));
}

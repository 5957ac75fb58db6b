//! Tests for domain_production against the in-memory store

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{BomId, Currency, ProductionOrderId, TenantId};
use domain_ledger::{
    JournalPostingService, LedgerError, LedgerQueryService, ManufacturingChartOfAccounts,
    SystemRole, VoucherSource,
};
use domain_production::{
    estimate_batch_cost, AllocationMethod, BillOfMaterials, BomCatalog, Material, PlannedCostKind,
    ProductionError, ProductionOrder, ProductionOrderService, ProductionOrderStatus,
};
use test_utils::{
    assert_trial_balance_balanced, assert_voucher_balanced, fixtures, generators, FailPoint,
    InMemoryStore,
};
use test_utils::fixtures::{ProductionFixture, OVERHEAD_ACCOUNT};

fn orders(fixture: &ProductionFixture) -> ProductionOrderService<InMemoryStore> {
    ProductionOrderService::new(fixture.store.clone(), Currency::USD)
}

/// Creates an order of 10 widgets and starts it
async fn started_order(fixture: &ProductionFixture) -> ProductionOrder {
    let service = orders(fixture);
    let order = service
        .create(fixture.tenant_id, "planner", fixture.bom.id, dec!(10), None)
        .await
        .unwrap();
    service
        .advance(fixture.tenant_id, "planner", order.id, ProductionOrderStatus::InProgress)
        .await
        .unwrap()
}

// ============================================================================
// BOM Catalog and Costing Tests
// ============================================================================

mod catalog_tests {
    use super::*;

    #[tokio::test]
    async fn test_estimate_percentage_of_material() {
        let fixture = fixtures::production_fixture(AllocationMethod::PercentageOfMaterial, dec!(10)).await;
        let catalog = BomCatalog::new(fixture.store.clone());

        let estimate = catalog.estimate(fixture.tenant_id, fixture.bom.id, dec!(10)).await.unwrap();

        assert_eq!(estimate.material_unit_cost, dec!(10.00));
        assert_eq!(estimate.overhead_unit_cost, dec!(1.00));
        assert_eq!(estimate.pre_scrap_unit_cost, dec!(11.00));
        assert_eq!(estimate.scrap_unit_cost, dec!(0.55));
        assert_eq!(estimate.final_unit_cost, dec!(11.55));
        assert_eq!(estimate.total, dec!(115.50));
    }

    #[tokio::test]
    async fn test_estimate_per_batch_spreads_over_quantity() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerBatch, dec!(50)).await;
        let catalog = BomCatalog::new(fixture.store.clone());

        let small = catalog.estimate(fixture.tenant_id, fixture.bom.id, dec!(10)).await.unwrap();
        let large = catalog.estimate(fixture.tenant_id, fixture.bom.id, dec!(100)).await.unwrap();

        assert_eq!(small.overhead_unit_cost, dec!(5.00));
        assert_eq!(large.overhead_unit_cost, dec!(0.50));
        assert_eq!(small.overhead, dec!(50));
        assert_eq!(large.overhead, dec!(50));
    }

    #[tokio::test]
    async fn test_estimate_uses_current_average_cost() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(0)).await;
        let catalog = BomCatalog::new(fixture.store.clone());

        catalog
            .update_average_cost(fixture.tenant_id, fixture.steel.id, dec!(6.00))
            .await
            .unwrap();
        let estimate = catalog.estimate(fixture.tenant_id, fixture.bom.id, dec!(1)).await.unwrap();

        assert_eq!(estimate.material_unit_cost, dec!(12.00));
    }

    #[tokio::test]
    async fn test_estimate_rejects_non_positive_quantity() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;
        let catalog = BomCatalog::new(fixture.store.clone());

        let result = catalog.estimate(fixture.tenant_id, fixture.bom.id, dec!(-1)).await;
        assert!(matches!(result, Err(ProductionError::InvalidBatchSize(_))));
    }

    #[tokio::test]
    async fn test_latest_active_version_wins() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;
        let catalog = BomCatalog::new(fixture.store.clone());

        let v2 = catalog
            .register_bom(
                BillOfMaterials::new(fixture.tenant_id, fixture.widget.id, 2)
                    .component(fixture.steel.id, dec!(3), "kg"),
            )
            .await
            .unwrap();
        catalog
            .register_bom(
                BillOfMaterials::new(fixture.tenant_id, fixture.widget.id, 3)
                    .component(fixture.steel.id, dec!(4), "kg")
                    .deactivated(),
            )
            .await
            .unwrap();

        let latest = catalog.latest_active(fixture.tenant_id, fixture.widget.id).await.unwrap();
        assert_eq!(latest.id, v2.id);
        assert_eq!(latest.version, 2);
    }

    #[tokio::test]
    async fn test_register_bom_requires_higher_version() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;
        let catalog = BomCatalog::new(fixture.store.clone());

        let result = catalog
            .register_bom(
                BillOfMaterials::new(fixture.tenant_id, fixture.widget.id, 1)
                    .component(fixture.steel.id, dec!(1), "kg"),
            )
            .await;

        assert!(matches!(result, Err(ProductionError::InvalidBom(_))));
    }

    #[tokio::test]
    async fn test_register_bom_requires_known_materials() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;
        let catalog = BomCatalog::new(fixture.store.clone());
        let stranger = Material::new(fixture.tenant_id, "RM-GHOST", "Unregistered", "kg", dec!(1));

        let result = catalog
            .register_bom(
                BillOfMaterials::new(fixture.tenant_id, fixture.widget.id, 2)
                    .component(stranger.id, dec!(1), "kg"),
            )
            .await;

        assert!(matches!(result, Err(ProductionError::MaterialNotFound(id)) if id == stranger.id));
    }

    #[tokio::test]
    async fn test_bom_round_trips_through_store() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;
        let catalog = BomCatalog::new(fixture.store.clone());

        let loaded = catalog.get_bom(fixture.tenant_id, fixture.bom.id).await.unwrap();
        assert_eq!(loaded, fixture.bom);
        assert_eq!(loaded.operations.len(), 2);
    }
}

// ============================================================================
// Order Creation Tests
// ============================================================================

mod creation_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_snapshots_planned_costs_without_posting() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1.00)).await;
        let service = orders(&fixture);

        let order = service
            .create(fixture.tenant_id, "planner", fixture.bom.id, dec!(10), Some("rush".to_string()))
            .await
            .unwrap();

        assert_eq!(order.status, ProductionOrderStatus::Pending);
        assert_eq!(order.finished_good, fixture.widget.id);
        assert!(order.completed_at.is_none());

        let details = service.get_order(fixture.tenant_id, order.id).await.unwrap();
        let overhead_rows: Vec<_> = details
            .planned_costs
            .iter()
            .filter(|row| row.kind == PlannedCostKind::Overhead)
            .collect();
        assert_eq!(overhead_rows.len(), 1);
        assert_eq!(overhead_rows[0].amount, dec!(10.00));
        assert_eq!(overhead_rows[0].gl_account.as_deref(), Some(OVERHEAD_ACCOUNT));
        assert!(details.consumptions.is_empty());
        assert_eq!(fixture.store.voucher_count(fixture.tenant_id).await, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_non_positive_quantity() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;

        let result = orders(&fixture)
            .create(fixture.tenant_id, "planner", fixture.bom.id, Decimal::ZERO, None)
            .await;

        assert!(matches!(result, Err(ProductionError::InvalidQuantity(_))));
    }

    #[tokio::test]
    async fn test_create_with_unknown_bom() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;
        let missing = BomId::new();

        let result = orders(&fixture)
            .create(fixture.tenant_id, "planner", missing, dec!(1), None)
            .await;

        assert!(matches!(result, Err(ProductionError::BomNotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn test_create_is_tenant_scoped() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;

        let result = orders(&fixture)
            .create(TenantId::new(), "planner", fixture.bom.id, dec!(1), None)
            .await;

        assert!(matches!(result, Err(ProductionError::BomNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_from_inactive_bom() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;
        let catalog = BomCatalog::new(fixture.store.clone());
        let retired = catalog
            .register_bom(
                BillOfMaterials::new(fixture.tenant_id, fixture.widget.id, 2)
                    .component(fixture.steel.id, dec!(1), "kg")
                    .deactivated(),
            )
            .await
            .unwrap();

        let result = orders(&fixture)
            .create(fixture.tenant_id, "planner", retired.id, dec!(1), None)
            .await;

        assert!(matches!(result, Err(ProductionError::BomInactive(id)) if id == retired.id));
    }

    #[tokio::test]
    async fn test_create_from_superseded_version_rejected() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;
        let catalog = BomCatalog::new(fixture.store.clone());
        let v2 = catalog
            .register_bom(
                BillOfMaterials::new(fixture.tenant_id, fixture.widget.id, 2)
                    .component(fixture.steel.id, dec!(3), "kg"),
            )
            .await
            .unwrap();
        let service = orders(&fixture);

        let stale = service
            .create(fixture.tenant_id, "planner", fixture.bom.id, dec!(10), None)
            .await;
        assert!(matches!(
            stale,
            Err(ProductionError::BomSuperseded { bom_id, latest })
                if bom_id == fixture.bom.id && latest == v2.id
        ));

        let current = service
            .create(fixture.tenant_id, "planner", v2.id, dec!(10), None)
            .await
            .unwrap();
        assert_eq!(current.bom_id, v2.id);
    }

    #[tokio::test]
    async fn test_create_with_overflowing_quantity_writes_nothing() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;

        let result = orders(&fixture)
            .create(fixture.tenant_id, "planner", fixture.bom.id, Decimal::MAX / dec!(2), None)
            .await;

        assert!(matches!(result, Err(ProductionError::CostOverflow)));
        assert_eq!(fixture.store.voucher_count(fixture.tenant_id).await, 0);
    }
}

// ============================================================================
// Lifecycle and Completion Tests
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_completing_pending_order_rejected() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;
        let service = orders(&fixture);
        let order = service
            .create(fixture.tenant_id, "planner", fixture.bom.id, dec!(10), None)
            .await
            .unwrap();

        let result = service
            .advance(fixture.tenant_id, "planner", order.id, ProductionOrderStatus::Completed)
            .await;

        assert!(matches!(
            result,
            Err(ProductionError::InvalidTransition {
                from: ProductionOrderStatus::Pending,
                to: ProductionOrderStatus::Completed,
            })
        ));
        assert_eq!(fixture.store.voucher_count(fixture.tenant_id).await, 0);
    }

    #[tokio::test]
    async fn test_completing_twice_rejected() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;
        let service = orders(&fixture);
        let order = started_order(&fixture).await;

        service
            .advance(fixture.tenant_id, "lead", order.id, ProductionOrderStatus::Completed)
            .await
            .unwrap();
        let again = service
            .advance(fixture.tenant_id, "lead", order.id, ProductionOrderStatus::Completed)
            .await;

        assert!(matches!(again, Err(ProductionError::InvalidTransition { .. })));
        assert_eq!(fixture.store.voucher_count(fixture.tenant_id).await, 1);
        assert_eq!(fixture.store.consumption_count(order.id).await, 1);
    }

    #[tokio::test]
    async fn test_completing_cancelled_order_rejected() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;
        let service = orders(&fixture);
        let order = started_order(&fixture).await;

        service
            .advance(fixture.tenant_id, "lead", order.id, ProductionOrderStatus::Cancelled)
            .await
            .unwrap();
        let result = service
            .advance(fixture.tenant_id, "lead", order.id, ProductionOrderStatus::Completed)
            .await;

        assert!(matches!(
            result,
            Err(ProductionError::InvalidTransition {
                from: ProductionOrderStatus::Cancelled,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_completion_posts_balanced_voucher() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1.00)).await;
        let service = orders(&fixture);
        let order = started_order(&fixture).await;

        let completed = service
            .advance(fixture.tenant_id, "lead", order.id, ProductionOrderStatus::Completed)
            .await
            .unwrap();

        assert_eq!(completed.status, ProductionOrderStatus::Completed);
        assert!(completed.completed_at.is_some());
        assert_eq!(completed.completed_by.as_deref(), Some("lead"));

        let voucher_id = completed.completion_voucher_id.unwrap();
        let posting = JournalPostingService::new(fixture.store.clone(), Currency::USD);
        let voucher = posting.get_voucher(fixture.tenant_id, voucher_id).await.unwrap();

        assert_voucher_balanced(&voucher);
        assert_eq!(voucher.source, VoucherSource::Production);
        assert_eq!(voucher.reference_id.as_deref(), Some(order.id.to_string().as_str()));
        assert_eq!(voucher.total_debit, dec!(110.00));

        let finished_goods = voucher.lines.iter().find(|l| l.account_code == "1220").unwrap();
        let raw_material = voucher.lines.iter().find(|l| l.account_code == "1200").unwrap();
        let overhead = voucher.lines.iter().find(|l| l.account_code == OVERHEAD_ACCOUNT).unwrap();
        assert_eq!(finished_goods.debit, dec!(110.00));
        assert_eq!(raw_material.credit, dec!(100.00));
        assert_eq!(overhead.credit, dec!(10.00));
    }

    #[tokio::test]
    async fn test_consumption_uses_cost_at_completion() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1.00)).await;
        let service = orders(&fixture);
        let order = started_order(&fixture).await;

        BomCatalog::new(fixture.store.clone())
            .update_average_cost(fixture.tenant_id, fixture.steel.id, dec!(5.50))
            .await
            .unwrap();
        service
            .advance(fixture.tenant_id, "lead", order.id, ProductionOrderStatus::Completed)
            .await
            .unwrap();

        let details = service.get_order(fixture.tenant_id, order.id).await.unwrap();
        assert_eq!(details.consumptions.len(), 1);
        let consumption = &details.consumptions[0];
        assert_eq!(consumption.material_id, fixture.steel.id);
        assert_eq!(consumption.quantity, dec!(20));
        assert_eq!(consumption.unit_cost, dec!(5.50));
        assert_eq!(consumption.total_cost, dec!(110.00));

        // Overhead stays at the creation-time snapshot
        let actual = details.order.actual_cost.unwrap();
        assert_eq!(actual.overhead, dec!(10.00));
        assert_eq!(actual.total, dec!(120.00));
    }

    #[tokio::test]
    async fn test_missing_finished_goods_role_keeps_order_in_progress() {
        let tenant_id = TenantId::new();
        let accounts = ManufacturingChartOfAccounts::standard_accounts(tenant_id)
            .into_iter()
            .filter(|a| a.system_role != Some(SystemRole::InventoryFinishedGoods))
            .collect();
        let store = InMemoryStore::with_accounts(accounts);
        let catalog = BomCatalog::new(store.clone());
        let steel = catalog
            .register_material(Material::new(tenant_id, "RM-STEEL", "Steel", "kg", dec!(5)))
            .await
            .unwrap();
        let widget = catalog
            .register_material(Material::new(tenant_id, "FG-WIDGET", "Widget", "ea", dec!(0)))
            .await
            .unwrap();
        let bom = catalog
            .register_bom(BillOfMaterials::new(tenant_id, widget.id, 1).component(steel.id, dec!(2), "kg"))
            .await
            .unwrap();

        let service = ProductionOrderService::new(store.clone(), Currency::USD);
        let order = service.create(tenant_id, "planner", bom.id, dec!(1), None).await.unwrap();
        service
            .advance(tenant_id, "planner", order.id, ProductionOrderStatus::InProgress)
            .await
            .unwrap();

        let result = service
            .advance(tenant_id, "lead", order.id, ProductionOrderStatus::Completed)
            .await;

        assert!(matches!(
            result,
            Err(ProductionError::Ledger(LedgerError::AccountNotConfigured {
                role: SystemRole::InventoryFinishedGoods
            }))
        ));
        let details = service.get_order(tenant_id, order.id).await.unwrap();
        assert_eq!(details.order.status, ProductionOrderStatus::InProgress);
        assert!(details.consumptions.is_empty());
        assert_eq!(store.voucher_count(tenant_id).await, 0);
    }

    #[tokio::test]
    async fn test_storage_failure_rolls_back_completion() {
        for point in [FailPoint::Consumptions, FailPoint::VoucherLine, FailPoint::OrderUpdate] {
            let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;
            let service = orders(&fixture);
            let order = started_order(&fixture).await;

            fixture.store.set_fail_point(point).await;
            let result = service
                .advance(fixture.tenant_id, "lead", order.id, ProductionOrderStatus::Completed)
                .await;
            fixture.store.clear_fail_point().await;

            assert!(result.is_err(), "{:?} should abort completion", point);
            let details = service.get_order(fixture.tenant_id, order.id).await.unwrap();
            assert_eq!(details.order.status, ProductionOrderStatus::InProgress);
            assert!(details.order.completion_voucher_id.is_none());
            assert_eq!(fixture.store.consumption_count(order.id).await, 0);
            assert_eq!(fixture.store.voucher_count(fixture.tenant_id).await, 0);
        }
    }

    #[tokio::test]
    async fn test_zero_cost_completion_posts_nothing() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(0)).await;
        BomCatalog::new(fixture.store.clone())
            .update_average_cost(fixture.tenant_id, fixture.steel.id, Decimal::ZERO)
            .await
            .unwrap();
        let service = orders(&fixture);
        let order = started_order(&fixture).await;

        let completed = service
            .advance(fixture.tenant_id, "lead", order.id, ProductionOrderStatus::Completed)
            .await
            .unwrap();

        assert_eq!(completed.status, ProductionOrderStatus::Completed);
        assert!(completed.completion_voucher_id.is_none());
        assert_eq!(fixture.store.voucher_count(fixture.tenant_id).await, 0);
        assert_eq!(fixture.store.consumption_count(order.id).await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_completion_posts_once() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;
        let order = started_order(&fixture).await;

        let handles: Vec<_> = ["line-a", "line-b"]
            .into_iter()
            .map(|actor| {
                let service = orders(&fixture);
                let tenant_id = fixture.tenant_id;
                tokio::spawn(async move {
                    service
                        .advance(tenant_id, actor, order.id, ProductionOrderStatus::Completed)
                        .await
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(ProductionError::InvalidTransition { .. })))
                .count(),
            1
        );
        assert_eq!(fixture.store.voucher_count(fixture.tenant_id).await, 1);
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;
        let missing = ProductionOrderId::new();

        let result = orders(&fixture)
            .advance(fixture.tenant_id, "lead", missing, ProductionOrderStatus::InProgress)
            .await;

        assert!(matches!(result, Err(ProductionError::OrderNotFound(id)) if id == missing));
    }
}

// ============================================================================
// Reconciliation Tests
// ============================================================================

mod reconciliation_tests {
    use super::*;

    #[tokio::test]
    async fn test_reconcile_before_completion_has_no_actuals() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;
        let order = started_order(&fixture).await;

        let report = orders(&fixture).reconcile(fixture.tenant_id, order.id).await.unwrap();

        assert_eq!(report.planned.material, dec!(100.00));
        assert_eq!(report.planned.overhead, dec!(10.00));
        assert_eq!(report.planned.scrap, dec!(5.50));
        assert_eq!(report.planned.total, dec!(115.50));
        assert!(report.actual.is_none());
        assert!(report.variance.is_none());
    }

    #[tokio::test]
    async fn test_reconcile_reports_variance() {
        let fixture = fixtures::production_fixture(AllocationMethod::PerUnit, dec!(1)).await;
        let service = orders(&fixture);
        let order = started_order(&fixture).await;

        BomCatalog::new(fixture.store.clone())
            .update_average_cost(fixture.tenant_id, fixture.steel.id, dec!(6.00))
            .await
            .unwrap();
        service
            .advance(fixture.tenant_id, "lead", order.id, ProductionOrderStatus::Completed)
            .await
            .unwrap();

        let report = service.reconcile(fixture.tenant_id, order.id).await.unwrap();
        let variance = report.variance.unwrap();

        assert_eq!(report.status, ProductionOrderStatus::Completed);
        assert_eq!(variance.material, dec!(20.00));
        assert_eq!(variance.overhead, dec!(0));
        assert_eq!(variance.scrap, dec!(-5.50));
        assert_eq!(variance.total, dec!(14.50));
    }

    #[tokio::test]
    async fn test_completion_keeps_trial_balance_balanced() {
        let fixture = fixtures::production_fixture(AllocationMethod::PercentageOfMaterial, dec!(10)).await;
        let service = orders(&fixture);
        let order = started_order(&fixture).await;
        let completed = service
            .advance(fixture.tenant_id, "lead", order.id, ProductionOrderStatus::Completed)
            .await
            .unwrap();

        let day = completed.completed_at.unwrap().date_naive();
        let report = LedgerQueryService::new(fixture.store.clone())
            .trial_balance(fixture.tenant_id, day, day)
            .await
            .unwrap();

        assert_trial_balance_balanced(&report);
        assert_eq!(report.total_debits, dec!(110.00));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn close(a: Decimal, b: Decimal) -> bool {
        (a - b).abs() <= dec!(0.0000000001)
    }

    proptest! {
        #[test]
        fn prop_total_scales_linearly_without_per_batch(
            bom in generators::costed_bom_strategy(vec![
                AllocationMethod::PerUnit,
                AllocationMethod::PercentageOfMaterial,
            ]),
            quantity in generators::quantity_strategy(),
        ) {
            let single = estimate_batch_cost(&bom, quantity).unwrap();
            let double = estimate_batch_cost(&bom, quantity * dec!(2)).unwrap();

            prop_assert!(close(double.total, single.total * dec!(2)));
        }

        #[test]
        fn prop_per_batch_overhead_stays_fixed(
            bom in generators::costed_bom_strategy(vec![AllocationMethod::PerBatch]),
            quantity in generators::quantity_strategy(),
        ) {
            let single = estimate_batch_cost(&bom, quantity).unwrap();
            let double = estimate_batch_cost(&bom, quantity * dec!(2)).unwrap();
            let fixed: Decimal = bom.overheads.iter().map(|o| o.cost).sum();

            prop_assert!(close(single.overhead, fixed));
            prop_assert!(close(double.overhead, fixed));
        }

        #[test]
        fn prop_total_is_sum_of_parts(
            bom in generators::costed_bom_strategy(vec![
                AllocationMethod::PerUnit,
                AllocationMethod::PerBatch,
                AllocationMethod::PercentageOfMaterial,
            ]),
            quantity in generators::quantity_strategy(),
        ) {
            let estimate = estimate_batch_cost(&bom, quantity).unwrap();

            prop_assert_eq!(estimate.total, estimate.material + estimate.overhead + estimate.scrap);
            prop_assert!(estimate.scrap >= Decimal::ZERO);
        }
    }
}

//! Pre-built Test Fixtures
//!
//! Seeded stores and a small production setup whose numbers match the
//! worked costing examples: one component at 2 x 5.00, a single overhead,
//! 5% scrap.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::TenantId;
use domain_ledger::ManufacturingChartOfAccounts;
use domain_production::{AllocationMethod, BillOfMaterials, BomCatalog, Material};
use crate::memory::InMemoryStore;

/// Store seeded with the standard manufacturing chart for a tenant
pub fn manufacturing_store(tenant_id: TenantId) -> InMemoryStore {
    InMemoryStore::with_accounts(ManufacturingChartOfAccounts::standard_accounts(tenant_id))
}

/// A tenant with materials and one active BOM
pub struct ProductionFixture {
    pub tenant_id: TenantId,
    pub store: InMemoryStore,
    pub steel: Material,
    pub widget: Material,
    pub bom: BillOfMaterials,
}

/// Account credited when the fixture's overhead is applied
pub const OVERHEAD_ACCOUNT: &str = "5100";

/// Builds a production setup around a single overhead item
///
/// # Panics
///
/// Panics if seeding the in-memory store fails
pub async fn production_fixture(allocation: AllocationMethod, overhead_cost: Decimal) -> ProductionFixture {
    let tenant_id = TenantId::new();
    let store = manufacturing_store(tenant_id);
    let catalog = BomCatalog::new(store.clone());

    let steel = catalog
        .register_material(Material::new(tenant_id, "RM-STEEL", "Steel sheet", "kg", dec!(5.00)))
        .await
        .expect("Failed to seed steel");
    let widget = catalog
        .register_material(Material::new(tenant_id, "FG-WIDGET", "Widget", "ea", dec!(0)))
        .await
        .expect("Failed to seed widget");

    let bom = BillOfMaterials::new(tenant_id, widget.id, 1)
        .with_batch_size(dec!(10))
        .with_scrap(dec!(5))
        .component(steel.id, dec!(2), "kg")
        .overhead("Factory overhead", "factory", allocation, overhead_cost, OVERHEAD_ACCOUNT)
        .operation(10, "Cut", None)
        .operation(20, "Assemble", Some("Torque to spec".to_string()));
    let bom = catalog.register_bom(bom).await.expect("Failed to seed BOM");

    ProductionFixture {
        tenant_id,
        store,
        steel,
        widget,
        bom,
    }
}

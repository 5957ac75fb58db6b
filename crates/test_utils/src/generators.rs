//! Property-Based Test Generators
//!
//! Provides proptest strategies for costing inputs that respect BOM
//! invariants (positive quantities, non-negative costs, scrap within 0..=100).

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::MaterialId;
use domain_production::{AllocationMethod, BomOverhead, CostedBom, CostedComponent};

/// Strategy for allocation methods
pub fn allocation_strategy() -> impl Strategy<Value = AllocationMethod> {
    prop_oneof![
        Just(AllocationMethod::PerUnit),
        Just(AllocationMethod::PerBatch),
        Just(AllocationMethod::PercentageOfMaterial),
    ]
}

/// Strategy for positive quantities with up to 2 decimal places
pub fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..100_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for non-negative unit costs with up to 4 decimal places
pub fn unit_cost_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|n| Decimal::new(n, 4))
}

/// Strategy for percentages between 0 and 100 with 2 decimal places
pub fn percentage_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for priced components
pub fn costed_component_strategy() -> impl Strategy<Value = CostedComponent> {
    (quantity_strategy(), unit_cost_strategy()).prop_map(|(quantity, unit_cost)| CostedComponent {
        material_id: MaterialId::new(),
        name: "component".to_string(),
        quantity,
        unit_cost,
    })
}

/// Strategy for overhead items using only the given allocation methods
pub fn overhead_strategy(
    methods: Vec<AllocationMethod>,
) -> impl Strategy<Value = BomOverhead> {
    (prop::sample::select(methods), unit_cost_strategy()).prop_map(|(allocation, cost)| BomOverhead {
        name: format!("{} overhead", allocation),
        category: "factory".to_string(),
        allocation,
        cost,
        gl_account: "5100".to_string(),
    })
}

/// Strategy for priced BOMs whose overheads use the given methods
pub fn costed_bom_strategy(methods: Vec<AllocationMethod>) -> impl Strategy<Value = CostedBom> {
    (
        percentage_strategy(),
        prop::collection::vec(costed_component_strategy(), 0..6),
        prop::collection::vec(overhead_strategy(methods), 0..4),
    )
        .prop_map(|(scrap_percentage, components, overheads)| CostedBom {
            scrap_percentage,
            components,
            overheads,
        })
}

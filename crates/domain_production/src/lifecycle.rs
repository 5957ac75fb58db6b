//! Production order lifecycle
//!
//! Creates orders with a planned-cost snapshot and drives them through
//! `Pending -> InProgress -> Completed` (or `Cancelled`). Completion records
//! material consumption at current average costs and capitalises finished
//! goods with one journal voucher, all in the same unit of work as the
//! status change.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use core_kernel::{BomId, Currency, ProductionOrderId, TenantId, UnitOfWork};
use domain_ledger::{
    post_in_session, AccountDirectory, EntryLine, JournalEntryRequest, LedgerStore, Side,
    SystemRole, VoucherSource,
};
use crate::catalog::price_bom;
use crate::costing::estimate_batch_cost;
use crate::error::ProductionError;
use crate::order::{
    Consumption, CostBreakdown, CostReconciliation, PlannedCost, PlannedCostKind, ProductionOrder,
    ProductionOrderStatus,
};
use crate::ports::ProductionSession;

/// An order with its planned costs and consumption records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: ProductionOrder,
    pub planned_costs: Vec<PlannedCost>,
    pub consumptions: Vec<Consumption>,
}

/// Service driving production orders
#[derive(Debug, Clone)]
pub struct ProductionOrderService<S> {
    store: S,
    currency: Currency,
}

impl<S> ProductionOrderService<S>
where
    S: LedgerStore,
    S::Session: ProductionSession,
{
    pub fn new(store: S, currency: Currency) -> Self {
        Self { store, currency }
    }

    /// Creates a pending order and snapshots its planned costs
    ///
    /// No journal entry is posted; the snapshot is informational until
    /// completion.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if `quantity` is not positive
    /// - `BomNotFound` / `BomInactive` for an unusable BOM
    /// - `BomSuperseded` if a newer active version exists
    /// - `MaterialNotFound` if a component's material is missing
    #[instrument(skip(self, notes))]
    pub async fn create(
        &self,
        tenant_id: TenantId,
        actor: &str,
        bom_id: BomId,
        quantity: Decimal,
        notes: Option<String>,
    ) -> Result<ProductionOrder, ProductionError> {
        if quantity <= Decimal::ZERO {
            return Err(ProductionError::InvalidQuantity(quantity));
        }

        let mut session = self.store.begin().await?;

        let bom = session
            .find_bom(tenant_id, bom_id)
            .await?
            .ok_or(ProductionError::BomNotFound(bom_id))?;
        if !bom.is_active() {
            return Err(ProductionError::BomInactive(bom_id));
        }
        // Only the newest active version may start new production
        if let Some(latest) = session.latest_active_bom(tenant_id, bom.finished_good).await? {
            if latest.id != bom_id {
                return Err(ProductionError::BomSuperseded {
                    bom_id,
                    latest: latest.id,
                });
            }
        }

        let costed = price_bom(&mut session, &bom).await?;
        let estimate = estimate_batch_cost(&costed, quantity)?;

        let order = ProductionOrder::new(tenant_id, bom.finished_good, bom_id, quantity, actor, notes);
        let planned = PlannedCost::snapshot(order.id, &estimate, self.currency);

        session.insert_order(&order).await?;
        session.insert_planned_costs(&planned).await?;
        session.commit().await?;

        info!(
            order_id = %order.id,
            planned_total = %estimate.total,
            "Created production order"
        );
        Ok(order)
    }

    /// Moves an order to `target`, completing it if `target` is Completed
    ///
    /// The order is locked for the duration of the unit of work, so of two
    /// concurrent completions only one observes `InProgress`.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if the order does not exist for the tenant
    /// - `InvalidTransition` if the state machine forbids the move
    /// - `AccountNotConfigured` (via `Ledger`) if inventory roles are missing
    #[instrument(skip(self))]
    pub async fn advance(
        &self,
        tenant_id: TenantId,
        actor: &str,
        order_id: ProductionOrderId,
        target: ProductionOrderStatus,
    ) -> Result<ProductionOrder, ProductionError> {
        let mut session = self.store.begin().await?;

        let mut order = session
            .lock_order(tenant_id, order_id)
            .await?
            .ok_or(ProductionError::OrderNotFound(order_id))?;
        let from = order.status;

        order.transition(target, actor, Utc::now())?;

        if target == ProductionOrderStatus::Completed {
            self.complete(&mut session, &mut order, actor).await?;
        }

        session.update_order(&order).await?;
        session.commit().await?;

        info!(%order_id, %from, to = %target, "Production order status changed");
        Ok(order)
    }

    /// Completion algorithm, run inside the caller's session
    async fn complete(
        &self,
        session: &mut S::Session,
        order: &mut ProductionOrder,
        actor: &str,
    ) -> Result<(), ProductionError> {
        let tenant_id = order.tenant_id;
        let bom = session
            .find_bom(tenant_id, order.bom_id)
            .await?
            .ok_or(ProductionError::BomNotFound(order.bom_id))?;
        let costed = price_bom(session, &bom).await?;

        let consumed_at = order.completed_at.unwrap_or_else(Utc::now);
        let consumptions = costed
            .components
            .iter()
            .map(|component| {
                let quantity = checked(component.quantity.checked_mul(order.quantity))?;
                let total_cost = checked(quantity.checked_mul(component.unit_cost))?;
                Ok(Consumption {
                    order_id: order.id,
                    material_id: component.material_id,
                    quantity,
                    unit_cost: component.unit_cost,
                    total_cost: self.currency.round(total_cost),
                    consumed_at,
                })
            })
            .collect::<Result<Vec<_>, ProductionError>>()?;
        let total_material = consumptions
            .iter()
            .try_fold(Decimal::ZERO, |acc, c| checked(acc.checked_add(c.total_cost)))?;

        // Overhead comes from the creation-time snapshot, not from the BOM
        let overheads: Vec<PlannedCost> = session
            .planned_costs(order.id)
            .await?
            .into_iter()
            .filter(|row| row.kind == PlannedCostKind::Overhead)
            .collect();
        let total_overhead = overheads
            .iter()
            .try_fold(Decimal::ZERO, |acc, row| checked(acc.checked_add(row.amount)))?;

        let raw_material = AccountDirectory::resolve(session, tenant_id, SystemRole::InventoryRawMaterial).await?;
        let finished_goods = AccountDirectory::resolve(session, tenant_id, SystemRole::InventoryFinishedGoods).await?;

        session.insert_consumptions(&consumptions).await?;

        let total = checked(total_material.checked_add(total_overhead))?;
        if total > Decimal::ZERO {
            let mut request = JournalEntryRequest::new(
                tenant_id,
                actor,
                VoucherSource::Production,
                format!("Finished goods from production order {}", order.id),
            )
            .dated(consumed_at.date_naive())
            .with_reference(order.id.to_string())
            .line(
                EntryLine::new(finished_goods.code.as_str(), Side::Debit, total)
                    .with_description(format!("Produced {} units", order.quantity)),
            );

            for (consumption, component) in consumptions.iter().zip(&costed.components) {
                if consumption.total_cost.is_zero() {
                    continue;
                }
                request = request.line(
                    EntryLine::new(raw_material.code.as_str(), Side::Credit, consumption.total_cost)
                        .with_description(format!("Consumed {} x {}", consumption.quantity, component.name)),
                );
            }

            for overhead in &overheads {
                if overhead.amount.is_zero() {
                    continue;
                }
                let account = overhead.gl_account.clone().unwrap_or_default();
                request = request.line(
                    EntryLine::new(account, Side::Credit, overhead.amount)
                        .with_description(format!("Applied overhead: {}", overhead.name)),
                );
            }

            let posted = post_in_session(session, &request, self.currency).await?;
            order.completion_voucher_id = Some(posted.voucher_id);
            debug!(voucher_id = %posted.voucher_id, %total, "Capitalised finished goods");
        } else {
            debug!(order_id = %order.id, "Zero-cost completion, no voucher posted");
        }

        order.actual_cost = Some(CostBreakdown {
            material: total_material,
            overhead: total_overhead,
            scrap: Decimal::ZERO,
            total,
        });
        Ok(())
    }

    /// Loads an order with planned costs and consumptions
    pub async fn get_order(
        &self,
        tenant_id: TenantId,
        order_id: ProductionOrderId,
    ) -> Result<OrderDetails, ProductionError> {
        let mut session = self.store.begin().await?;
        let order = session
            .find_order(tenant_id, order_id)
            .await?
            .ok_or(ProductionError::OrderNotFound(order_id))?;
        let planned_costs = session.planned_costs(order_id).await?;
        let consumptions = session.consumptions(order_id).await?;

        Ok(OrderDetails {
            order,
            planned_costs,
            consumptions,
        })
    }

    /// Planned against actual costs of an order
    pub async fn reconcile(
        &self,
        tenant_id: TenantId,
        order_id: ProductionOrderId,
    ) -> Result<CostReconciliation, ProductionError> {
        let details = self.get_order(tenant_id, order_id).await?;
        let planned = PlannedCost::breakdown(&details.planned_costs);
        let actual = details.order.actual_cost;

        Ok(CostReconciliation {
            order_id,
            status: details.order.status,
            quantity: details.order.quantity,
            planned,
            actual,
            variance: actual.map(|actual| actual.minus(&planned)),
        })
    }
}

fn checked(value: Option<Decimal>) -> Result<Decimal, ProductionError> {
    value.ok_or(ProductionError::CostOverflow)
}

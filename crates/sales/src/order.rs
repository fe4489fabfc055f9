use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use fishledger_catalog::Catalog;
use fishledger_core::{
    DomainError, DomainResult, Entity, InvoiceId, LocationId, SalesOrderId, SalesUnitId,
};
use fishledger_inventory::{LedgerTransaction, StockError, StockResult};

use crate::fulfilment::{LineValuation, SoldQuantity, consume_sold};
use crate::invoice::Invoice;

/// Sales order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesOrderStatus {
    Confirmed,
    Preparing,
    Delivered,
    Invoiced,
    Cancelled,
}

/// Order line: sales unit, quantity, unit price fixed at confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub sales_unit: SalesUnitId,
    pub quantity: f64,
    pub unit_price: f64,
    pub valuation: Option<LineValuation>,
}

impl OrderLine {
    pub fn amount(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// Customer order, delivered from one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrder {
    pub id: SalesOrderId,
    pub customer: String,
    pub location: LocationId,
    pub status: SalesOrderStatus,
    pub ordered_on: NaiveDate,
    pub delivered_on: Option<NaiveDate>,
    pub invoice: Option<InvoiceId>,
    pub lines: Vec<OrderLine>,
}

impl SalesOrder {
    /// Take an order, pricing every line from the catalog.
    pub fn confirm(
        id: SalesOrderId,
        customer: impl Into<String>,
        location: LocationId,
        lines: &[SoldQuantity],
        catalog: &dyn Catalog,
        date: NaiveDate,
    ) -> StockResult<Self> {
        let customer = customer.into();
        if customer.trim().is_empty() {
            return Err(DomainError::validation("customer cannot be empty").into());
        }
        if lines.is_empty() {
            return Err(DomainError::validation("an order needs at least one line").into());
        }
        if catalog.location(location).is_none() {
            return Err(StockError::reference(location));
        }

        let mut order_lines = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            if !line.quantity.is_finite() || line.quantity <= 0.0 {
                return Err(DomainError::validation("quantity must be positive").into());
            }
            let unit = catalog
                .sales_unit(line.sales_unit)
                .ok_or_else(|| StockError::reference(line.sales_unit))?;
            order_lines.push(OrderLine {
                line_no: i as u32 + 1,
                sales_unit: line.sales_unit,
                quantity: line.quantity,
                unit_price: unit.price,
                valuation: None,
            });
        }

        Ok(Self {
            id,
            customer,
            location,
            status: SalesOrderStatus::Confirmed,
            ordered_on: date,
            delivered_on: None,
            invoice: None,
            lines: order_lines,
        })
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self.status, SalesOrderStatus::Confirmed | SalesOrderStatus::Preparing)
    }

    pub fn total_amount(&self) -> f64 {
        self.lines.iter().map(OrderLine::amount).sum()
    }

    /// Cost of goods delivered, once delivered.
    pub fn cost_of_goods(&self) -> Option<f64> {
        self.lines
            .iter()
            .map(|l| l.valuation.as_ref().map(|v| v.cost))
            .sum()
    }

    pub fn start_preparing(&mut self) -> DomainResult<()> {
        if self.status != SalesOrderStatus::Confirmed {
            return Err(DomainError::invariant(format!(
                "cannot prepare an order in status {:?}",
                self.status
            )));
        }
        self.status = SalesOrderStatus::Preparing;
        Ok(())
    }

    /// Hand the goods over; consumes stock for every line.
    pub fn deliver(
        &mut self,
        tx: &mut LedgerTransaction<'_>,
        catalog: &dyn Catalog,
        date: NaiveDate,
    ) -> StockResult<f64> {
        if self.status != SalesOrderStatus::Preparing {
            return Err(DomainError::invariant(format!(
                "cannot deliver an order in status {:?}",
                self.status
            ))
            .into());
        }

        let sold: Vec<SoldQuantity> = self
            .lines
            .iter()
            .map(|l| SoldQuantity {
                sales_unit: l.sales_unit,
                quantity: l.quantity,
            })
            .collect();
        let prices: Vec<f64> = self.lines.iter().map(|l| l.unit_price).collect();
        let valuations = consume_sold(tx, catalog, self.location, &sold, &prices)?;

        let cost = valuations.iter().map(|v| v.cost).sum();
        for (line, valuation) in self.lines.iter_mut().zip(valuations) {
            line.valuation = Some(valuation);
        }
        self.status = SalesOrderStatus::Delivered;
        self.delivered_on = Some(date);
        Ok(cost)
    }

    /// Bill a delivered order.
    pub fn invoice(&mut self, id: InvoiceId, date: NaiveDate) -> DomainResult<Invoice> {
        if self.status != SalesOrderStatus::Delivered {
            return Err(DomainError::invariant(format!(
                "cannot invoice an order in status {:?}",
                self.status
            )));
        }
        let invoice = Invoice::issue(id, self.id, self.customer.clone(), self.total_amount(), date)?;
        self.status = SalesOrderStatus::Invoiced;
        self.invoice = Some(id);
        Ok(invoice)
    }

    pub fn cancel(&mut self) -> DomainResult<()> {
        if !self.is_cancellable() {
            return Err(DomainError::invariant(format!(
                "cannot cancel an order in status {:?}",
                self.status
            )));
        }
        self.status = SalesOrderStatus::Cancelled;
        Ok(())
    }
}

impl Entity for SalesOrder {
    type Id = SalesOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fishledger_catalog::{InMemoryCatalog, Location, LocationKind, Product, SalesUnit, StockUnit};
    use fishledger_core::{DocumentId, ProductId};
    use fishledger_inventory::{NewBatch, SourceRef, StockLedger};
    use proptest::prelude::*;

    const FISH: ProductId = ProductId(1);
    const STORE: LocationId = LocationId(1);
    const WHOLE: SalesUnitId = SalesUnitId(10);

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 8).unwrap()
    }

    fn catalog() -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new();
        catalog.add_product(Product::new(FISH, "tuna", StockUnit::Kg, 6000.0).unwrap()).unwrap();
        catalog.add_sales_unit(SalesUnit::new(WHOLE, "tuna kg", FISH, 1.0, 8000.0).unwrap()).unwrap();
        catalog
            .add_location(Location {
                id: STORE,
                name: "Harbour".to_string(),
                kind: LocationKind::Store,
            })
            .unwrap();
        catalog
    }

    fn ledger(quantity: f64) -> StockLedger {
        let mut ledger = StockLedger::default();
        ledger
            .receive(NewBatch {
                product: FISH,
                location: STORE,
                lot: "T1".to_string(),
                quantity,
                unit_cost: 6000.0,
                expiry: day(),
                source: SourceRef::Opening,
            })
            .unwrap();
        ledger
    }

    fn order(quantity: f64) -> SalesOrder {
        SalesOrder::confirm(
            SalesOrderId::new(DocumentId::from_sequence(1)),
            "Hotel Lagune",
            STORE,
            &[SoldQuantity {
                sales_unit: WHOLE,
                quantity,
            }],
            &catalog(),
            day(),
        )
        .unwrap()
    }

    #[test]
    fn confirm_prices_lines_from_the_catalog() {
        let order = order(3.0);
        assert_eq!(order.status, SalesOrderStatus::Confirmed);
        assert_eq!(order.lines[0].unit_price, 8000.0);
        assert_eq!(order.total_amount(), 24_000.0);
        assert_eq!(order.cost_of_goods(), None);
    }

    #[test]
    fn confirm_rejects_unknown_units_and_empty_orders() {
        let err = SalesOrder::confirm(
            SalesOrderId::new(DocumentId::from_sequence(1)),
            "Hotel Lagune",
            STORE,
            &[SoldQuantity {
                sales_unit: SalesUnitId(77),
                quantity: 1.0,
            }],
            &catalog(),
            day(),
        )
        .unwrap_err();
        assert!(matches!(err, StockError::ReferenceNotFound(_)));

        let err = SalesOrder::confirm(
            SalesOrderId::new(DocumentId::from_sequence(1)),
            "Hotel Lagune",
            STORE,
            &[],
            &catalog(),
            day(),
        )
        .unwrap_err();
        assert!(matches!(err, StockError::Domain(DomainError::Validation(_))));
    }

    #[test]
    fn full_lifecycle_through_invoice() {
        let mut ledger = ledger(10.0);
        let mut order = order(4.0);

        order.start_preparing().unwrap();
        let mut tx = ledger.begin(Utc::now());
        let cost = order.deliver(&mut tx, &catalog(), day()).unwrap();
        ledger.apply(tx.commit().unwrap());

        assert_eq!(cost, 24_000.0);
        assert_eq!(order.cost_of_goods(), Some(24_000.0));
        assert_eq!(ledger.on_hand(FISH, STORE), 6.0);

        let invoice = order.invoice(InvoiceId::new(DocumentId::from_sequence(9)), day()).unwrap();
        assert_eq!(invoice.amount, 32_000.0);
        assert_eq!(order.status, SalesOrderStatus::Invoiced);
        assert_eq!(order.invoice, Some(invoice.id));
    }

    #[test]
    fn delivery_requires_preparation() {
        let ledger = ledger(10.0);
        let mut order = order(1.0);
        let mut tx = ledger.begin(Utc::now());
        assert!(order.deliver(&mut tx, &catalog(), day()).is_err());
        assert!(order.invoice(InvoiceId::new(DocumentId::from_sequence(2)), day()).is_err());
    }

    #[test]
    fn short_delivery_fails_the_commit() {
        let ledger = ledger(2.0);
        let mut order = order(5.0);
        order.start_preparing().unwrap();

        let mut tx = ledger.begin(Utc::now());
        order.deliver(&mut tx, &catalog(), day()).unwrap();
        let err = tx.commit().unwrap_err();

        assert_eq!(err.shortfalls()[0].missing, 3.0);
        assert_eq!(ledger.on_hand(FISH, STORE), 2.0);
    }

    #[test]
    fn cancellation_only_before_delivery() {
        let mut order = order(1.0);
        order.start_preparing().unwrap();
        order.cancel().unwrap();
        assert_eq!(order.status, SalesOrderStatus::Cancelled);
        assert!(order.cancel().is_err());
        assert!(order.start_preparing().is_err());
    }

    proptest! {
        #[test]
        fn delivered_cost_matches_lot_cost(quantity in 0.01f64..10.0) {
            let ledger = ledger(10.0);
            let mut order = order(quantity);
            order.start_preparing().unwrap();
            let mut tx = ledger.begin(Utc::now());
            let cost = order.deliver(&mut tx, &catalog(), day()).unwrap();
            prop_assert!((cost - quantity * 6000.0).abs() < 1e-6);
            prop_assert!(tx.commit().is_ok());
        }
    }
}

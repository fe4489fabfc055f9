use std::sync::Arc;

use chrono::NaiveDate;

use fishledger_catalog::Catalog;
use fishledger_core::{
    DomainResult, InvoiceId, LocationId, SaleClosureId, SalesOrderId, SalesUnitId,
};
use fishledger_inventory::{StockError, StockResult};
use fishledger_sales::{Invoice, SaleClosure, SalesOrder, SoldQuantity};

use crate::ledger::LedgerService;
use crate::store::{DocumentStore, insert, load, save};

/// Till closures, customer orders and their invoices.
pub struct SalesService {
    ledger: Arc<LedgerService>,
    catalog: Arc<dyn Catalog>,
    closures: Arc<dyn DocumentStore<SaleClosureId, SaleClosure>>,
    orders: Arc<dyn DocumentStore<SalesOrderId, SalesOrder>>,
    invoices: Arc<dyn DocumentStore<InvoiceId, Invoice>>,
}

impl SalesService {
    pub fn new(
        ledger: Arc<LedgerService>,
        catalog: Arc<dyn Catalog>,
        closures: Arc<dyn DocumentStore<SaleClosureId, SaleClosure>>,
        orders: Arc<dyn DocumentStore<SalesOrderId, SalesOrder>>,
        invoices: Arc<dyn DocumentStore<InvoiceId, Invoice>>,
    ) -> Self {
        Self {
            ledger,
            catalog,
            closures,
            orders,
            invoices,
        }
    }

    pub fn closure(&self, id: SaleClosureId) -> DomainResult<Option<SaleClosure>> {
        self.closures.get(&id)
    }

    pub fn order(&self, id: SalesOrderId) -> DomainResult<Option<SalesOrder>> {
        self.orders.get(&id)
    }

    pub fn invoice(&self, id: InvoiceId) -> DomainResult<Option<Invoice>> {
        self.invoices.get(&id)
    }

    pub fn open_closure(&self, location: LocationId, business_date: NaiveDate) -> StockResult<SaleClosure> {
        if self.catalog.location(location).is_none() {
            return Err(StockError::reference(location));
        }
        let closure = SaleClosure::draft(
            SaleClosureId::new(self.ledger.ids().next_id()),
            location,
            business_date,
        );
        insert(self.closures.as_ref(), closure.clone())?;
        Ok(closure)
    }

    pub fn add_closure_line(
        &self,
        id: SaleClosureId,
        sales_unit: SalesUnitId,
        quantity: f64,
    ) -> DomainResult<SaleClosure> {
        self.ledger.exclusive(|| {
            let mut closure = load(self.closures.as_ref(), &id, "sale closure")?;
            closure.add_line(sales_unit, quantity)?;
            save(self.closures.as_ref(), closure.clone())?;
            Ok(closure)
        })
    }

    /// Consume the day's sales from the store's stock.
    pub fn validate_closure(&self, id: SaleClosureId) -> StockResult<SaleClosure> {
        self.ledger.execute_and_record(
            "sales.closure.validate",
            |tx| {
                let mut closure = load(self.closures.as_ref(), &id, "sale closure")?;
                closure.validate(tx, self.catalog.as_ref())?;
                Ok(closure)
            },
            |closure| Ok(save(self.closures.as_ref(), closure.clone())?),
        )
    }

    pub fn confirm_order(
        &self,
        customer: &str,
        location: LocationId,
        lines: &[SoldQuantity],
    ) -> StockResult<SalesOrder> {
        let order = SalesOrder::confirm(
            SalesOrderId::new(self.ledger.ids().next_id()),
            customer,
            location,
            lines,
            self.catalog.as_ref(),
            self.ledger.today(),
        )?;
        insert(self.orders.as_ref(), order.clone())?;
        Ok(order)
    }

    pub fn start_preparing(&self, id: SalesOrderId) -> DomainResult<SalesOrder> {
        self.transition(id, SalesOrder::start_preparing)
    }

    pub fn cancel_order(&self, id: SalesOrderId) -> DomainResult<SalesOrder> {
        self.transition(id, SalesOrder::cancel)
    }

    fn transition(
        &self,
        id: SalesOrderId,
        f: impl FnOnce(&mut SalesOrder) -> DomainResult<()>,
    ) -> DomainResult<SalesOrder> {
        self.ledger.exclusive(|| {
            let mut order = load(self.orders.as_ref(), &id, "sales order")?;
            f(&mut order)?;
            save(self.orders.as_ref(), order.clone())?;
            Ok(order)
        })
    }

    pub fn deliver(&self, id: SalesOrderId) -> StockResult<SalesOrder> {
        let date = self.ledger.today();
        self.ledger.execute_and_record(
            "sales.order.deliver",
            |tx| {
                let mut order = load(self.orders.as_ref(), &id, "sales order")?;
                order.deliver(tx, self.catalog.as_ref(), date)?;
                Ok(order)
            },
            |order| Ok(save(self.orders.as_ref(), order.clone())?),
        )
    }

    pub fn invoice_order(&self, id: SalesOrderId) -> DomainResult<(SalesOrder, Invoice)> {
        self.ledger.exclusive(|| {
            let mut order = load(self.orders.as_ref(), &id, "sales order")?;
            let invoice = order.invoice(InvoiceId::new(self.ledger.ids().next_id()), self.ledger.today())?;
            insert(self.invoices.as_ref(), invoice.clone())?;
            save(self.orders.as_ref(), order.clone())?;
            Ok((order, invoice))
        })
    }

    pub fn pay_invoice(&self, id: InvoiceId) -> DomainResult<Invoice> {
        self.ledger.exclusive(|| {
            let mut invoice = load(self.invoices.as_ref(), &id, "invoice")?;
            invoice.mark_paid(self.ledger.today())?;
            save(self.invoices.as_ref(), invoice.clone())?;
            Ok(invoice)
        })
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use fishledger_core::{DomainError, DomainResult, Entity, InvoiceId, SalesOrderId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Issued,
    Paid,
}

/// Customer invoice for one delivered order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub order: SalesOrderId,
    pub customer: String,
    pub amount: f64,
    pub status: InvoiceStatus,
    pub issued_on: NaiveDate,
    pub paid_on: Option<NaiveDate>,
}

impl Invoice {
    pub fn issue(
        id: InvoiceId,
        order: SalesOrderId,
        customer: String,
        amount: f64,
        date: NaiveDate,
    ) -> DomainResult<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(DomainError::validation("invoice amount must be non-negative"));
        }
        Ok(Self {
            id,
            order,
            customer,
            amount,
            status: InvoiceStatus::Issued,
            issued_on: date,
            paid_on: None,
        })
    }

    pub fn mark_paid(&mut self, date: NaiveDate) -> DomainResult<()> {
        if self.status == InvoiceStatus::Paid {
            return Err(DomainError::invariant("invoice is already paid"));
        }
        if date < self.issued_on {
            return Err(DomainError::validation("payment date precedes the invoice"));
        }
        self.status = InvoiceStatus::Paid;
        self.paid_on = Some(date);
        Ok(())
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

//! Stock movement events, published after a transaction is applied.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use fishledger_core::{LocationId, ProductId};
use fishledger_events::Event;

use crate::batch::SourceRef;
use crate::consumption::ConsumedLine;

/// Event: BatchReceived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReceived {
    pub product: ProductId,
    pub location: LocationId,
    pub lot: String,
    pub quantity: f64,
    pub unit_cost: f64,
    pub expiry: NaiveDate,
    pub source: SourceRef,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockConsumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockConsumed {
    pub product: ProductId,
    pub location: LocationId,
    pub lines: Vec<ConsumedLine>,
    pub total_cost: f64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StockEvent {
    BatchReceived(BatchReceived),
    StockConsumed(StockConsumed),
}

impl StockEvent {
    pub fn product(&self) -> ProductId {
        match self {
            StockEvent::BatchReceived(e) => e.product,
            StockEvent::StockConsumed(e) => e.product,
        }
    }

    pub fn location(&self) -> LocationId {
        match self {
            StockEvent::BatchReceived(e) => e.location,
            StockEvent::StockConsumed(e) => e.location,
        }
    }
}

impl Event for StockEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StockEvent::BatchReceived(_) => "stock.batch.received",
            StockEvent::StockConsumed(_) => "stock.consumed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StockEvent::BatchReceived(e) => e.occurred_at,
            StockEvent::StockConsumed(e) => e.occurred_at,
        }
    }
}

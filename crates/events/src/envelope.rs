use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope for a published event, containing stream metadata.
///
/// - `sequence_number` increases monotonically per stream.
/// - `correlation` names the business operation that produced the event
///   (e.g. "arrival.receive"), so subscribers can group movements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    stream: String,
    sequence_number: u64,
    correlation: String,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        stream: impl Into<String>,
        sequence_number: u64,
        correlation: impl Into<String>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            stream: stream.into(),
            sequence_number,
            correlation: correlation.into(),
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn correlation(&self) -> &str {
        &self.correlation
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

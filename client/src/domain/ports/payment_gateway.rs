//! Port for charging a card for a catalogue item.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use crate::domain::ItemId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment gateways.
    pub enum PaymentError {
        /// The card number failed validation.
        InvalidCard { message: String } => "{message}",
        /// The gateway declined the charge.
        Declined { message: String } => "payment declined: {message}",
    }
}

/// Charge request for a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Item being bought.
    pub item: ItemId,
    /// Card number as typed; separators are allowed.
    pub card_number: Zeroizing<String>,
}

impl PaymentRequest {
    /// Build a request for `item` charged to `card_number`.
    pub fn new(item: ItemId, card_number: impl Into<String>) -> Self {
        Self {
            item,
            card_number: Zeroizing::new(card_number.into()),
        }
    }

    /// Number of decimal digits in the card number, ignoring separators.
    pub fn card_digits(&self) -> usize {
        self.card_number
            .chars()
            .filter(char::is_ascii_digit)
            .count()
    }
}

/// Proof of a successful charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    /// Gateway transaction identifier.
    pub transaction_id: String,
    /// Item that was paid for.
    pub item: ItemId,
    /// When the charge settled.
    pub paid_at: DateTime<Utc>,
}

/// Card payment gateway.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge the card in `request`.
    async fn charge(&self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentError>;
}

/// Async sleep used to simulate gateway latency.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

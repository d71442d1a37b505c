//! Simulated card payment gateway.
//!
//! Stands in for a real processor: it waits a fixed latency, applies a
//! length check to the card number and issues a random transaction id.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::domain::ports::{PaymentError, PaymentGateway, PaymentReceipt, PaymentRequest, Sleeper};

/// Latency applied to every charge unless configured otherwise.
pub const DEFAULT_PAYMENT_DELAY: Duration = Duration::from_millis(2000);
/// Card numbers with fewer digits are rejected.
pub const MIN_CARD_DIGITS: usize = 16;

const TRANSACTION_PREFIX: &str = "tx_";
const TRANSACTION_SUFFIX_LEN: usize = 9;
const RADIX: u32 = 36;

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Gateway that approves any card with enough digits.
pub struct SimulatedPaymentGateway {
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
    delay: Duration,
    rng: Mutex<SmallRng>,
}

impl SimulatedPaymentGateway {
    /// Gateway with the default latency and an entropy-seeded generator.
    pub fn new(sleeper: Arc<dyn Sleeper>, clock: Arc<dyn Clock>) -> Self {
        Self {
            sleeper,
            clock,
            delay: DEFAULT_PAYMENT_DELAY,
            rng: Mutex::new(SmallRng::from_entropy()),
        }
    }

    /// Override the simulated latency.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Seed the transaction id generator.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(SmallRng::seed_from_u64(seed));
        self
    }

    fn transaction_id(&self) -> String {
        let mut rng = self.rng.lock();
        let suffix: String = (0..TRANSACTION_SUFFIX_LEN)
            .filter_map(|_| char::from_digit(rng.gen_range(0..RADIX), RADIX))
            .collect();
        format!("{TRANSACTION_PREFIX}{suffix}")
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPaymentGateway {
    async fn charge(&self, request: &PaymentRequest) -> Result<PaymentReceipt, PaymentError> {
        self.sleeper.sleep(self.delay).await;
        if request.card_digits() < MIN_CARD_DIGITS {
            return Err(PaymentError::invalid_card("Invalid card number"));
        }
        let receipt = PaymentReceipt {
            transaction_id: self.transaction_id(),
            item: request.item.clone(),
            paid_at: self.clock.utc(),
        };
        info!(
            transaction_id = %receipt.transaction_id,
            item = %receipt.item,
            "payment approved"
        );
        Ok(receipt)
    }
}

//! Buying catalogue items.

use std::sync::Arc;

use tracing::{info, warn};

use super::ports::{PaymentError, PaymentGateway, PaymentReceipt, PaymentRequest};
use super::{Error, ItemId, SessionState};

fn map_payment_error(error: PaymentError) -> Error {
    match error {
        PaymentError::InvalidCard { message } => Error::invalid_request(message),
        PaymentError::Declined { message } => {
            Error::forbidden(format!("payment declined: {message}"))
        }
    }
}

/// Result of [`CheckoutService::purchase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// The session already owned the item; nothing was charged.
    AlreadyOwned,
    /// The card was charged and the item added to the session.
    Purchased(PaymentReceipt),
}

/// Checkout use-case: charge a card, then grant the entitlement.
#[derive(Clone)]
pub struct CheckoutService {
    session: Arc<SessionState>,
    payments: Arc<dyn PaymentGateway>,
}

impl CheckoutService {
    /// Create the service.
    pub fn new(session: Arc<SessionState>, payments: Arc<dyn PaymentGateway>) -> Self {
        Self { session, payments }
    }

    /// Buy `item` with `card_number`.
    ///
    /// Requires a signed-in session. Owned items short-circuit without a
    /// charge. If a login or logout happens while the charge is in flight the
    /// entitlement is not granted, even when the same user signed back in.
    pub async fn purchase(&self, item: ItemId, card_number: &str) -> Result<PurchaseOutcome, Error> {
        let generation = self.session.generation();
        let Some(buyer) = self.session.user().map(|user| user.id().clone()) else {
            return Err(Error::unauthorized("sign in to purchase items"));
        };
        if self.session.has_purchased(&item) {
            return Ok(PurchaseOutcome::AlreadyOwned);
        }

        let request = PaymentRequest::new(item.clone(), card_number);
        let receipt = self
            .payments
            .charge(&request)
            .await
            .map_err(map_payment_error)?;

        if self.session.add_purchase_in(generation, item).is_none() {
            warn!(
                user_id = %buyer,
                transaction_id = %receipt.transaction_id,
                "session changed during checkout; entitlement not granted"
            );
            return Err(Error::unauthorized(
                "session changed during checkout; sign in again to access the item",
            ));
        }

        info!(
            user_id = %buyer,
            item = %receipt.item,
            transaction_id = %receipt.transaction_id,
            "purchase completed"
        );
        Ok(PurchaseOutcome::Purchased(receipt))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{MockPaymentGateway, MockSessionStore};
    use async_trait::async_trait;
    use crate::domain::{AccessToken, ErrorCode, SessionEvents, UserId, UserRecord};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn item() -> ItemId {
        ItemId::new("weathered-oak").expect("item")
    }

    fn receipt() -> PaymentReceipt {
        PaymentReceipt {
            transaction_id: "tx_abc123xyz".to_owned(),
            item: item(),
            paid_at: Utc
                .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
                .single()
                .expect("timestamp"),
        }
    }

    async fn signed_in_session() -> Arc<SessionState> {
        let mut store = MockSessionStore::new();
        store.expect_save().returning(|_| Ok(()));
        store.expect_clear().returning(|| Ok(()));
        let session = Arc::new(SessionState::new(Arc::new(store), SessionEvents::default()));
        session
            .login(
                UserRecord::new(UserId::new("u-1").expect("id"), "ada@example.com"),
                AccessToken::new("tok").expect("token"),
            )
            .await
            .expect("login");
        session
    }

    #[rstest]
    #[tokio::test]
    async fn purchase_charges_and_grants_entitlement() {
        let session = signed_in_session().await;
        let mut payments = MockPaymentGateway::new();
        payments
            .expect_charge()
            .withf(|request| request.item == item() && request.card_digits() == 16)
            .times(1)
            .returning(|_| Ok(receipt()));
        let service = CheckoutService::new(session.clone(), Arc::new(payments));

        let outcome = service
            .purchase(item(), "4242 4242 4242 4242")
            .await
            .expect("purchase");

        assert_eq!(outcome, PurchaseOutcome::Purchased(receipt()));
        assert!(session.has_purchased(&item()));
    }

    #[rstest]
    #[tokio::test]
    async fn owned_items_are_not_charged_twice() {
        let session = signed_in_session().await;
        session.add_purchase(item());
        let mut payments = MockPaymentGateway::new();
        payments.expect_charge().times(0);
        let service = CheckoutService::new(session, Arc::new(payments));

        let outcome = service
            .purchase(item(), "4242424242424242")
            .await
            .expect("purchase");

        assert_eq!(outcome, PurchaseOutcome::AlreadyOwned);
    }

    #[rstest]
    #[tokio::test]
    async fn signed_out_sessions_cannot_buy() {
        let session = Arc::new(SessionState::new(
            Arc::new(MockSessionStore::new()),
            SessionEvents::default(),
        ));
        let mut payments = MockPaymentGateway::new();
        payments.expect_charge().times(0);
        let service = CheckoutService::new(session, Arc::new(payments));

        let err = service
            .purchase(item(), "4242424242424242")
            .await
            .expect_err("unauthorised");

        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    struct RelogDuringCharge {
        session: Arc<SessionState>,
    }

    #[async_trait]
    impl PaymentGateway for RelogDuringCharge {
        async fn charge(&self, _request: &PaymentRequest) -> Result<PaymentReceipt, PaymentError> {
            let _ = self.session.logout().await;
            self.session
                .login(
                    UserRecord::new(UserId::new("u-1").expect("id"), "ada@example.com"),
                    AccessToken::new("tok-2").expect("token"),
                )
                .await
                .expect("login");
            Ok(receipt())
        }
    }

    #[rstest]
    #[tokio::test]
    async fn signing_in_again_mid_charge_grants_nothing() {
        let session = signed_in_session().await;
        let payments = RelogDuringCharge {
            session: session.clone(),
        };
        let service = CheckoutService::new(session.clone(), Arc::new(payments));

        let err = service
            .purchase(item(), "4242424242424242")
            .await
            .expect_err("session changed");

        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert!(session.is_logged_in());
        assert!(!session.has_purchased(&item()));
    }

    #[rstest]
    #[case(PaymentError::invalid_card("Invalid card number"), ErrorCode::InvalidRequest)]
    #[case(PaymentError::declined("insufficient funds"), ErrorCode::Forbidden)]
    #[tokio::test]
    async fn payment_failures_grant_nothing(#[case] failure: PaymentError, #[case] code: ErrorCode) {
        let session = signed_in_session().await;
        let mut payments = MockPaymentGateway::new();
        payments.expect_charge().return_once(move |_| Err(failure));
        let service = CheckoutService::new(session.clone(), Arc::new(payments));

        let err = service.purchase(item(), "4242").await.expect_err("failed");

        assert_eq!(err.code(), code);
        assert!(!session.has_purchased(&item()));
    }
}

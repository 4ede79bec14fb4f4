//! Resolves the active payment method catalogue once at start-up.
//!
//! Precedence: the canonical `payment_methods` table, then the configured
//! comma separated list, then [`PaymentMethodSet::fallback`]. A source that
//! fails or is empty simply yields to the next one.

use tracing::{info, warn};

use crate::domain::ports::PaymentMethodSource;
use crate::domain::{PaymentMethodOrigin, PaymentMethodSet};

/// Load the catalogue consumed by every payment method validation.
pub async fn load_payment_methods(
    source: &dyn PaymentMethodSource,
    configured: Option<&str>,
) -> PaymentMethodSet {
    let from_source = match source.load_codes().await {
        Ok(codes) => PaymentMethodSet::from_codes(codes, PaymentMethodOrigin::Database)
            .map_err(|err| warn!(error = %err, "ignoring payment method table"))
            .ok(),
        Err(err) => {
            warn!(error = %err, "payment method table unavailable");
            None
        }
    };

    let from_config = || {
        configured.and_then(|list| {
            PaymentMethodSet::parse_list(list, PaymentMethodOrigin::Configuration)
                .map_err(|err| warn!(error = %err, "ignoring configured payment methods"))
                .ok()
        })
    };

    let set = from_source
        .or_else(from_config)
        .unwrap_or_else(PaymentMethodSet::fallback);

    let codes: Vec<&str> = set.iter().map(|method| method.as_str()).collect();
    info!(origin = %set.origin(), methods = ?codes, "payment methods loaded");
    set
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::{MockPaymentMethodSource, PaymentMethodSourceError};

    fn source_returning(
        result: Result<Vec<String>, PaymentMethodSourceError>,
    ) -> MockPaymentMethodSource {
        let mut source = MockPaymentMethodSource::new();
        source.expect_load_codes().return_once(move || result);
        source
    }

    fn codes(set: &PaymentMethodSet) -> Vec<String> {
        set.iter().map(ToString::to_string).collect()
    }

    #[rstest]
    #[tokio::test]
    async fn database_codes_win_over_configuration() {
        let source = source_returning(Ok(vec!["nagad".to_owned(), "card".to_owned()]));

        let set = load_payment_methods(&source, Some("bkash")).await;

        assert_eq!(set.origin(), PaymentMethodOrigin::Database);
        assert_eq!(codes(&set), ["nagad", "card"]);
    }

    #[rstest]
    #[case::empty_table(Ok(Vec::new()))]
    #[case::missing_table(Err(PaymentMethodSourceError::query("relation does not exist")))]
    #[tokio::test]
    async fn configuration_is_used_when_table_yields_nothing(
        #[case] result: Result<Vec<String>, PaymentMethodSourceError>,
    ) {
        let source = source_returning(result);

        let set = load_payment_methods(&source, Some("card, bkash")).await;

        assert_eq!(set.origin(), PaymentMethodOrigin::Configuration);
        assert_eq!(codes(&set), ["card", "bkash"]);
    }

    #[rstest]
    #[tokio::test]
    async fn over_long_configured_code_falls_back() {
        let source = source_returning(Ok(Vec::new()));
        let configured = format!("card, {}", "m".repeat(33));

        let set = load_payment_methods(&source, Some(&configured)).await;

        assert_eq!(set, PaymentMethodSet::fallback());
    }

    #[rstest]
    #[case(None)]
    #[case(Some(" , "))]
    #[tokio::test]
    async fn static_fallback_is_last_resort(#[case] configured: Option<&str>) {
        let source = source_returning(Err(PaymentMethodSourceError::connection("refused")));

        let set = load_payment_methods(&source, configured).await;

        assert_eq!(set, PaymentMethodSet::fallback());
    }
}

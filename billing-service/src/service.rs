use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{BillingError, BillingResult};
use crate::models::{BillingStatus, ChargeInput, InvoiceAmounts};
use crate::round_money;

/// GST rate applied to service charges unless configured otherwise
pub const DEFAULT_GST_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 0);

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Billing service
#[derive(Debug, Clone)]
pub struct BillingService {
    default_gst_rate: Decimal,
}

impl BillingService {
    /// Create a new billing service
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_gst_rate: DEFAULT_GST_RATE,
        }
    }

    #[must_use]
    pub fn with_default_gst_rate(mut self, rate: Decimal) -> Self {
        self.default_gst_rate = rate;
        self
    }

    /// Compute invoice amounts from charge components
    ///
    /// GST is charged on the service charge only; the fare is a pass-through.
    ///
    /// # Errors
    /// `Validation` for negative components, a GST rate outside 0..=100 or a
    /// discount larger than the gross amount.
    pub fn compute_invoice(&self, input: &ChargeInput) -> BillingResult<InvoiceAmounts> {
        for (name, value) in [
            ("base_fare", input.base_fare),
            ("service_charge", input.service_charge),
            ("other_charges", input.other_charges),
            ("discount", input.discount),
        ] {
            if value < Decimal::ZERO {
                return Err(BillingError::Validation(format!("{name} cannot be negative")));
            }
        }

        let gst_rate = input.gst_rate.unwrap_or(self.default_gst_rate);
        if gst_rate < Decimal::ZERO || gst_rate > HUNDRED {
            return Err(BillingError::Validation(
                "gst_rate must be between 0 and 100".to_string(),
            ));
        }

        let base_fare = round_money(input.base_fare);
        let service_charge = round_money(input.service_charge);
        let other_charges = round_money(input.other_charges);
        let discount = round_money(input.discount);
        let gst_amount = round_money(service_charge * gst_rate / HUNDRED);

        let gross = base_fare + service_charge + gst_amount + other_charges;
        if discount > gross {
            return Err(BillingError::Validation(format!(
                "discount {discount} exceeds gross amount {gross}"
            )));
        }
        let total_amount = gross - discount;

        debug!(%total_amount, %gst_amount, "Invoice computed");

        Ok(InvoiceAmounts {
            base_fare,
            service_charge,
            gst_rate,
            gst_amount,
            other_charges,
            discount,
            total_amount,
        })
    }

    /// Status implied by the amount received against a bill
    #[must_use]
    pub fn derive_status(&self, total: Decimal, paid: Decimal) -> BillingStatus {
        if paid >= total {
            BillingStatus::Paid
        } else if paid <= Decimal::ZERO {
            BillingStatus::Unpaid
        } else {
            BillingStatus::PartiallyPaid
        }
    }

    /// Amount still to be collected, never negative
    #[must_use]
    pub fn outstanding(&self, total: Decimal, paid: Decimal) -> Decimal {
        (total - paid).max(Decimal::ZERO)
    }

    /// Charges may be revised only while nothing has been received
    ///
    /// # Errors
    /// `InvalidStatus` once the bill is cancelled or has any payment.
    pub fn ensure_adjustable(&self, status: BillingStatus, paid: Decimal) -> BillingResult<()> {
        if status == BillingStatus::Cancelled || paid > Decimal::ZERO {
            return Err(BillingError::InvalidStatus(status.as_str().to_string()));
        }
        Ok(())
    }
}

impl Default for BillingService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn charges() -> ChargeInput {
        ChargeInput {
            base_fare: dec!(2450.00),
            service_charge: dec!(150.00),
            gst_rate: None,
            other_charges: dec!(20.00),
            discount: dec!(50.00),
        }
    }

    #[test]
    fn gst_applies_to_service_charge_only() {
        let inv = BillingService::new().compute_invoice(&charges()).unwrap();
        assert_eq!(inv.gst_rate, dec!(18));
        assert_eq!(inv.gst_amount, dec!(27.00));
        assert_eq!(inv.total_amount, dec!(2597.00));
        assert_eq!(inv.ticket_value(), dec!(2470.00));
    }

    #[test]
    fn gst_is_rounded_to_paise() {
        let input = ChargeInput {
            service_charge: dec!(33.33),
            discount: Decimal::ZERO,
            ..charges()
        };
        let inv = BillingService::new().compute_invoice(&input).unwrap();
        // 33.33 * 18% = 5.9994
        assert_eq!(inv.gst_amount, dec!(6.00));
    }

    #[test]
    fn explicit_rate_overrides_default() {
        let input = ChargeInput {
            gst_rate: Some(dec!(5)),
            ..charges()
        };
        let inv = BillingService::new()
            .with_default_gst_rate(dec!(12))
            .compute_invoice(&input)
            .unwrap();
        assert_eq!(inv.gst_amount, dec!(7.50));
    }

    #[test]
    fn rejects_negative_and_oversized_discount() {
        let svc = BillingService::new();
        let negative = ChargeInput {
            base_fare: dec!(-1),
            ..charges()
        };
        assert!(svc.compute_invoice(&negative).is_err());

        let huge_discount = ChargeInput {
            discount: dec!(999999),
            ..charges()
        };
        assert!(svc.compute_invoice(&huge_discount).is_err());

        let bad_rate = ChargeInput {
            gst_rate: Some(dec!(101)),
            ..charges()
        };
        assert!(svc.compute_invoice(&bad_rate).is_err());
    }

    #[test]
    fn status_follows_payments() {
        let svc = BillingService::new();
        assert_eq!(svc.derive_status(dec!(100), dec!(0)), BillingStatus::Unpaid);
        assert_eq!(svc.derive_status(dec!(100), dec!(40)), BillingStatus::PartiallyPaid);
        assert_eq!(svc.derive_status(dec!(100), dec!(100)), BillingStatus::Paid);
        assert_eq!(svc.derive_status(dec!(0), dec!(0)), BillingStatus::Paid);
        assert_eq!(svc.outstanding(dec!(100), dec!(120)), Decimal::ZERO);
    }

    #[test]
    fn adjustments_blocked_after_payment() {
        let svc = BillingService::new();
        assert!(svc.ensure_adjustable(BillingStatus::Unpaid, Decimal::ZERO).is_ok());
        assert!(svc
            .ensure_adjustable(BillingStatus::PartiallyPaid, dec!(1))
            .is_err());
        assert!(svc
            .ensure_adjustable(BillingStatus::Cancelled, Decimal::ZERO)
            .is_err());
    }
}

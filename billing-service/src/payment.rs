use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::models::PaymentMode;
use crate::round_money;

/// Largest number of shares a single allocation may produce
pub const MAX_ALLOCATION_SHARES: usize = 1000;

/// Split an amount into `count` equal shares
///
/// Each share is rounded to two decimals and the rounding difference is
/// added to the last share, so the shares always sum to the rounded amount.
/// A count of zero yields no shares.
///
/// # Errors
/// `Validation` when the amount is negative or `count` exceeds
/// [`MAX_ALLOCATION_SHARES`].
pub fn calculate_payment_allocation(amount: Decimal, count: usize) -> BillingResult<Vec<Decimal>> {
    if amount < Decimal::ZERO {
        return Err(BillingError::Validation(
            "allocation amount cannot be negative".to_string(),
        ));
    }
    if count > MAX_ALLOCATION_SHARES {
        return Err(BillingError::Validation(format!(
            "an allocation can have at most {MAX_ALLOCATION_SHARES} shares, got {count}"
        )));
    }
    if count == 0 {
        return Ok(Vec::new());
    }

    let amount = round_money(amount);
    let divisor = Decimal::from(count);
    let share = round_money(amount / divisor);
    let remainder = amount - share * divisor;

    let mut shares = vec![share; count];
    if let Some(last) = shares.last_mut() {
        *last += remainder;
    }
    Ok(shares)
}

/// An open bill a payment can be applied to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenBill {
    pub billing_id: Uuid,
    pub outstanding: Decimal,
}

/// One share of a payment applied to a bill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AllocationLine {
    pub billing_id: Uuid,
    pub amount: Decimal,
}

/// Plan how a payment is applied across bills
///
/// The payment is split equally across `bills` in the given order.
///
/// # Errors
/// `OverAllocation` when a share exceeds that bill's outstanding amount,
/// `Validation` when the amount is too small to split.
pub fn plan_allocation(amount: Decimal, bills: &[OpenBill]) -> BillingResult<Vec<AllocationLine>> {
    let shares = calculate_payment_allocation(amount, bills.len())?;
    if shares.iter().any(|s| *s < Decimal::ZERO) {
        return Err(BillingError::Validation(format!(
            "{amount} is too small to split across {} bills",
            bills.len()
        )));
    }

    bills
        .iter()
        .zip(shares)
        .filter(|(_, share)| *share > Decimal::ZERO)
        .map(|(bill, share)| {
            if share > bill.outstanding {
                return Err(BillingError::OverAllocation {
                    billing_id: bill.billing_id,
                    requested: share,
                    outstanding: bill.outstanding,
                });
            }
            Ok(AllocationLine {
                billing_id: bill.billing_id,
                amount: share,
            })
        })
        .collect()
}

/// Check a payment before it is recorded
///
/// # Errors
/// `Validation` for a non-positive amount or a missing instrument reference.
pub fn validate_payment(
    amount: Decimal,
    mode: PaymentMode,
    reference_no: Option<&str>,
) -> BillingResult<()> {
    if amount <= Decimal::ZERO {
        return Err(BillingError::Validation(
            "payment amount must be greater than zero".to_string(),
        ));
    }
    if round_money(amount) != amount {
        return Err(BillingError::Validation(
            "payment amount cannot have more than two decimals".to_string(),
        ));
    }
    let has_reference = reference_no.is_some_and(|r| !r.trim().is_empty());
    if mode.requires_reference() && !has_reference {
        return Err(BillingError::Validation(format!(
            "reference_no is required for {mode} payments"
        )));
    }
    Ok(())
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::BillingError;

/// Settlement state of a billing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
    Cancelled,
}

impl BillingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "UNPAID",
            Self::PartiallyPaid => "PARTIALLY_PAID",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Whether payments may still be applied
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Unpaid | Self::PartiallyPaid)
    }
}

impl fmt::Display for BillingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UNPAID" => Ok(Self::Unpaid),
            "PARTIALLY_PAID" => Ok(Self::PartiallyPaid),
            "PAID" => Ok(Self::Paid),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(BillingError::UnknownValue(format!("billing status {s}"))),
        }
    }
}

impl TryFrom<String> for BillingStatus {
    type Error = BillingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// How a customer paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    Cash,
    Upi,
    Card,
    BankTransfer,
    Cheque,
}

impl PaymentMode {
    pub const ALL: [PaymentMode; 5] = [
        PaymentMode::Cash,
        PaymentMode::Upi,
        PaymentMode::Card,
        PaymentMode::BankTransfer,
        PaymentMode::Cheque,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Upi => "UPI",
            Self::Card => "CARD",
            Self::BankTransfer => "BANK_TRANSFER",
            Self::Cheque => "CHEQUE",
        }
    }

    /// Modes whose instrument number must be captured
    #[must_use]
    pub fn requires_reference(self) -> bool {
        matches!(self, Self::BankTransfer | Self::Cheque)
    }

    /// Money lands in the cash box rather than the bank
    #[must_use]
    pub fn is_cash(self) -> bool {
        self == Self::Cash
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CASH" => Ok(Self::Cash),
            "UPI" => Ok(Self::Upi),
            "CARD" => Ok(Self::Card),
            "BANK_TRANSFER" | "NEFT" | "RTGS" | "IMPS" => Ok(Self::BankTransfer),
            "CHEQUE" => Ok(Self::Cheque),
            _ => Err(BillingError::UnknownValue(format!("payment mode {s}"))),
        }
    }
}

impl TryFrom<String> for PaymentMode {
    type Error = BillingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Charge components entered when raising a bill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChargeInput {
    pub base_fare: Decimal,
    pub service_charge: Decimal,
    /// Percentage applied to the service charge; configured default when absent
    pub gst_rate: Option<Decimal>,
    pub other_charges: Decimal,
    pub discount: Decimal,
}

/// Computed invoice amounts, all rounded to two decimals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InvoiceAmounts {
    pub base_fare: Decimal,
    pub service_charge: Decimal,
    pub gst_rate: Decimal,
    pub gst_amount: Decimal,
    pub other_charges: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
}

impl InvoiceAmounts {
    /// Fare plus other charges, the part credited to ticket sales
    #[must_use]
    pub fn ticket_value(&self) -> Decimal {
        self.base_fare + self.other_charges
    }
}

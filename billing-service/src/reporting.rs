use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::PaymentMode;

/// An unpaid balance on one bill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutstandingItem {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub bill_date: NaiveDate,
    pub outstanding: Decimal,
}

/// Receivables for one customer split by age of the bill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CustomerAging {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub age_0_30: Decimal,
    pub age_31_60: Decimal,
    pub age_61_90: Decimal,
    pub age_91_plus: Decimal,
    pub total_due: Decimal,
}

impl CustomerAging {
    fn empty(customer_id: Uuid, customer_name: String) -> Self {
        Self {
            customer_id,
            customer_name,
            age_0_30: Decimal::ZERO,
            age_31_60: Decimal::ZERO,
            age_61_90: Decimal::ZERO,
            age_91_plus: Decimal::ZERO,
            total_due: Decimal::ZERO,
        }
    }

    fn add(&mut self, age_days: i64, amount: Decimal) {
        let bucket = match age_days {
            ..=30 => &mut self.age_0_30,
            31..=60 => &mut self.age_31_60,
            61..=90 => &mut self.age_61_90,
            _ => &mut self.age_91_plus,
        };
        *bucket += amount;
        self.total_due += amount;
    }
}

/// Bucket outstanding bills by customer and age as of a date
///
/// Customers are ordered by total due, largest first.
#[must_use]
pub fn aging_report(as_of: NaiveDate, items: &[OutstandingItem]) -> Vec<CustomerAging> {
    let mut by_customer: BTreeMap<Uuid, CustomerAging> = BTreeMap::new();

    for item in items.iter().filter(|i| i.outstanding > Decimal::ZERO) {
        let age = (as_of - item.bill_date).num_days();
        by_customer
            .entry(item.customer_id)
            .or_insert_with(|| CustomerAging::empty(item.customer_id, item.customer_name.clone()))
            .add(age, item.outstanding);
    }

    let mut rows: Vec<_> = by_customer.into_values().collect();
    rows.sort_by(|a, b| b.total_due.cmp(&a.total_due));
    rows
}

/// Collections received through one payment mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ModeTotal {
    pub mode: PaymentMode,
    pub count: u64,
    pub amount: Decimal,
}

/// Collections over a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CollectionSummary {
    pub total: Decimal,
    pub count: u64,
    pub by_mode: Vec<ModeTotal>,
}

/// Total collections per payment mode, in the fixed mode order
#[must_use]
pub fn summarize_collections(payments: &[(PaymentMode, Decimal)]) -> CollectionSummary {
    let by_mode: Vec<ModeTotal> = PaymentMode::ALL
        .into_iter()
        .filter_map(|mode| {
            let (count, amount) = payments
                .iter()
                .filter(|(m, _)| *m == mode)
                .fold((0u64, Decimal::ZERO), |(c, a), (_, amt)| (c + 1, a + amt));
            (count > 0).then_some(ModeTotal { mode, count, amount })
        })
        .collect();

    CollectionSummary {
        total: by_mode.iter().map(|m| m.amount).sum(),
        count: by_mode.iter().map(|m| m.count).sum(),
        by_mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(customer: Uuid, days_ago: i64, amount: Decimal) -> OutstandingItem {
        let as_of = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        OutstandingItem {
            customer_id: customer,
            customer_name: "Mehta Travels".to_string(),
            bill_date: as_of - chrono::Duration::days(days_ago),
            outstanding: amount,
        }
    }

    #[test]
    fn buckets_by_age() {
        let c = Uuid::new_v4();
        let as_of = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let rows = aging_report(
            as_of,
            &[
                item(c, 0, dec!(100)),
                item(c, 30, dec!(10)),
                item(c, 31, dec!(200)),
                item(c, 75, dec!(300)),
                item(c, 120, dec!(400)),
                item(c, 5, Decimal::ZERO),
            ],
        );
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.age_0_30, dec!(110));
        assert_eq!(row.age_31_60, dec!(200));
        assert_eq!(row.age_61_90, dec!(300));
        assert_eq!(row.age_91_plus, dec!(400));
        assert_eq!(row.total_due, dec!(1010));
    }

    #[test]
    fn largest_debtor_first() {
        let small = Uuid::new_v4();
        let large = Uuid::new_v4();
        let as_of = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let rows = aging_report(as_of, &[item(small, 1, dec!(5)), item(large, 1, dec!(50))]);
        let order: Vec<_> = rows.iter().map(|r| r.customer_id).collect();
        assert_eq!(order, vec![large, small]);
    }

    #[test]
    fn collections_grouped_by_mode() {
        let summary = summarize_collections(&[
            (PaymentMode::Upi, dec!(100)),
            (PaymentMode::Cash, dec!(50)),
            (PaymentMode::Upi, dec!(25.50)),
        ]);
        assert_eq!(summary.total, dec!(175.50));
        assert_eq!(summary.count, 3);
        let modes: Vec<_> = summary.by_mode.iter().map(|m| (m.mode, m.count)).collect();
        assert_eq!(modes, vec![(PaymentMode::Cash, 1), (PaymentMode::Upi, 2)]);
    }
}

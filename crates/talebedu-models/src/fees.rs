//! Student fee records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::collections::Collection;
use crate::record::impl_sync_record;

/// A fee row (remote table `student_fees`) as cached offline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_fee_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Fee {
    /// Amount still owed: amount + late fee - discount - paid, never negative.
    pub fn balance_due(&self) -> f64 {
        let owed = self.amount.unwrap_or(0.0) + self.late_fee_amount.unwrap_or(0.0)
            - self.discount_amount.unwrap_or(0.0)
            - self.paid_amount.unwrap_or(0.0);
        owed.max(0.0)
    }

    /// Whether the fee is past its due date on `today` and not fully paid.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date.is_some_and(|due| due < today) && self.balance_due() > 0.0
    }
}

impl_sync_record!(Fee, Collection::Fees);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fee(value: Value) -> Fee {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_balance_due() {
        let f = fee(json!({
            "id": "f1",
            "amount": 120.0,
            "paid_amount": 50.0,
            "discount_amount": 10.0,
            "late_fee_amount": 5.0
        }));
        assert_eq!(f.balance_due(), 65.0);
    }

    #[test]
    fn test_overpaid_balance_is_zero() {
        let f = fee(json!({"id": "f2", "amount": 10.0, "paid_amount": 25.0}));
        assert_eq!(f.balance_due(), 0.0);
    }

    #[test]
    fn test_is_overdue() {
        let f = fee(json!({"id": "f3", "amount": 10.0, "due_date": "2025-09-01"}));
        let before = NaiveDate::from_ymd_opt(2025, 8, 31).unwrap();
        let after = NaiveDate::from_ymd_opt(2025, 9, 2).unwrap();
        assert!(!f.is_overdue(before));
        assert!(f.is_overdue(after));
    }
}

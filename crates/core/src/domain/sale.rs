// Sale Domain Model

use crate::domain::cart::CartLine;
use crate::domain::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            other => Err(DomainError::UnknownPaymentMethod(other.to_string())),
        }
    }
}

/// Completed sale. Immutable once stored; `items` is a frozen copy of the
/// cart lines at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub items: Vec<CartLine>,
    pub total: f64,
    pub payment_method: PaymentMethod,
    pub cash_amount: Option<f64>,
    pub change: Option<f64>,
    pub timestamp: i64, // epoch ms
}

impl Sale {
    /// Snapshot `lines` into a sale.
    ///
    /// Cash payments must cover the total; change is computed from it.
    /// Card payments ignore `cash_amount`.
    pub fn checkout(
        id: impl Into<String>,
        lines: &[CartLine],
        payment_method: PaymentMethod,
        cash_amount: Option<f64>,
        timestamp: i64,
    ) -> Result<Self> {
        if lines.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        let total: f64 = lines.iter().map(CartLine::subtotal).sum();

        let (cash_amount, change) = match payment_method {
            PaymentMethod::Cash => {
                let given = cash_amount.unwrap_or(total);
                if given < total {
                    return Err(DomainError::InsufficientCash { given, total });
                }
                (Some(given), Some(given - total))
            }
            PaymentMethod::Card => (None, None),
        };

        Ok(Self {
            id: id.into(),
            items: lines.to_vec(),
            total,
            payment_method,
            cash_amount,
            change,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str, price: f64, quantity: i64) -> CartLine {
        CartLine {
            id: id.to_string(),
            name: format!("item {}", id),
            price,
            quantity,
            barcode: format!("bc-{}", id),
            image: None,
        }
    }

    #[test]
    fn test_cash_checkout_computes_change() {
        let lines = vec![line("a", 2.0, 3), line("b", 4.0, 1)];
        let sale = Sale::checkout("s1", &lines, PaymentMethod::Cash, Some(20.0), 5000).unwrap();

        assert_eq!(sale.total, 10.0);
        assert_eq!(sale.cash_amount, Some(20.0));
        assert_eq!(sale.change, Some(10.0));
        assert_eq!(sale.items, lines);
    }

    #[test]
    fn test_card_checkout_has_no_change() {
        let sale =
            Sale::checkout("s2", &[line("a", 1.5, 2)], PaymentMethod::Card, Some(50.0), 1).unwrap();
        assert_eq!(sale.total, 3.0);
        assert!(sale.cash_amount.is_none());
        assert!(sale.change.is_none());
    }

    #[test]
    fn test_insufficient_cash_rejected() {
        let err = Sale::checkout("s3", &[line("a", 5.0, 2)], PaymentMethod::Cash, Some(3.0), 1)
            .unwrap_err();
        assert!(matches!(err, DomainError::InsufficientCash { .. }));
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = Sale::checkout("s4", &[], PaymentMethod::Card, None, 1).unwrap_err();
        assert_eq!(err, DomainError::EmptyCart);
    }
}

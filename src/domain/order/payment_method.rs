//! How the customer paid for an order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment method recorded at submission. Verification happens upstream;
/// this subsystem only displays it to the reviewing admin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    EWallet,
    Crypto,
    /// Any method the storefront adds without a code change here.
    Other(String),
}

impl PaymentMethod {
    /// Storage representation.
    pub fn as_str(&self) -> &str {
        match self {
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::EWallet => "e_wallet",
            PaymentMethod::Crypto => "crypto",
            PaymentMethod::Other(name) => name,
        }
    }

    /// Parses the storage form; unknown names are kept verbatim.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "bank_transfer" => PaymentMethod::BankTransfer,
            "e_wallet" | "ewallet" => PaymentMethod::EWallet,
            "crypto" => PaymentMethod::Crypto,
            _ => PaymentMethod::Other(s.to_string()),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::BankTransfer => write!(f, "Bank transfer"),
            PaymentMethod::EWallet => write!(f, "E-wallet"),
            PaymentMethod::Crypto => write!(f, "Crypto"),
            PaymentMethod::Other(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_methods_roundtrip_through_storage_form() {
        for method in [
            PaymentMethod::BankTransfer,
            PaymentMethod::EWallet,
            PaymentMethod::Crypto,
        ] {
            assert_eq!(PaymentMethod::parse(method.as_str()), method);
        }
    }

    #[test]
    fn unknown_methods_are_preserved() {
        let method = PaymentMethod::parse("gift_card");
        assert_eq!(method, PaymentMethod::Other("gift_card".to_string()));
        assert_eq!(method.as_str(), "gift_card");
    }
}

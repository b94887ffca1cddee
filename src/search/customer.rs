//! Customer lookup for the order-intake form: name search through a
//! resolver, plus the exact phone shortcut.

use crate::clients::{ConsoleApi, TransportError};
use crate::framework::Fetcher;
use crate::model::{Customer, Suggestion, SuggestionKind};
use crate::text::digits_only;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Name matches shown under the customer field.
pub const CUSTOMER_SUGGESTIONS: usize = 5;

/// Digits a phone number needs before it is looked up.
pub const MIN_PHONE_DIGITS: usize = 10;

/// Label for a customer suggestion: `"Ana Souza (16) 99999-0000"`.
pub fn customer_label(customer: &Customer) -> String {
    let phone = format_phone(&customer.phone);
    if phone.is_empty() {
        customer.name.clone()
    } else {
        format!("{} {}", customer.name, phone)
    }
}

/// Formats Brazilian phone digits as `(DD) NNNN-NNNN` or `(DD) NNNNN-NNNN`.
/// Partial input is formatted as far as it goes.
pub fn format_phone(text: &str) -> String {
    let digits: String = digits_only(text).chars().take(11).collect();
    match digits.len() {
        0 => String::new(),
        1..=2 => format!("({digits}"),
        3..=6 => format!("({}) {}", &digits[..2], &digits[2..]),
        7..=10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        _ => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
    }
}

/// Fetches customers whose name matches the field text.
#[derive(Clone)]
pub struct CustomerFetcher {
    api: ConsoleApi,
}

impl CustomerFetcher {
    pub fn new(api: ConsoleApi) -> Self {
        Self { api }
    }

    /// Exact lookup once the phone field holds enough digits. Misses and
    /// failures both come back as `None`.
    pub async fn lookup_by_phone(&self, phone: &str) -> Option<Customer> {
        let digits = digits_only(phone);
        if digits.len() < MIN_PHONE_DIGITS {
            return None;
        }
        match self.api.customer_by_phone(&digits).await {
            Ok(found) => {
                debug!(found = found.is_some(), "Phone lookup");
                found
            }
            Err(e) => {
                warn!(error = %e, "Phone lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl Fetcher for CustomerFetcher {
    async fn fetch(&self, text: &str) -> Result<Vec<Suggestion>, TransportError> {
        let customers = self.api.search_customers(text.trim()).await?;
        customers
            .into_iter()
            .take(CUSTOMER_SUGGESTIONS)
            .map(|customer| -> Result<Suggestion, TransportError> {
                let raw = serde_json::to_value(&customer)?;
                Ok(Suggestion::new(customer_label(&customer), SuggestionKind::Customer, raw))
            })
            .collect()
    }
}

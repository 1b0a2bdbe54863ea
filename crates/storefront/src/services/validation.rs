//! Checkout form validation.
//!
//! Collects every problem at once so the form can highlight all invalid
//! fields in one round trip.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use haardhout_core::{Email, PaymentMethod, PostalCode};
use regex::Regex;

use super::checkout::{CheckoutRequest, CustomerInput};
use crate::commerce::{Address, LineItem};

/// Maximum quantity of one product per order.
pub const MAX_QUANTITY: u32 = 100;

/// Maximum length of the order note.
const MAX_NOTE_LENGTH: usize = 1000;

/// Dutch phone number after removing spaces and dashes.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+31|0031|0)[1-9][0-9]{8}$").expect("Invalid regex"));

/// Field name to message.
pub type FieldErrors = BTreeMap<String, String>;

/// Validated customer details.
#[derive(Debug, Clone)]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub email: Email,
    pub phone: String,
    pub street: String,
    /// House number including any suffix (e.g. `12A`).
    pub house_number: String,
    pub postal_code: PostalCode,
    pub city: String,
}

impl Customer {
    /// Address in the commerce backend's layout.
    #[must_use]
    pub fn to_address(&self) -> Address {
        Address {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            company: self.company.clone().unwrap_or_default(),
            address_1: format!("{} {}", self.street, self.house_number),
            postcode: self.postal_code.to_string(),
            city: self.city.clone(),
            country: "NL".to_string(),
            email: self.email.to_string(),
            phone: self.phone.clone(),
        }
    }
}

/// A checkout request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidCheckout {
    pub customer: Customer,
    pub items: Vec<LineItem>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

/// Validate a checkout request.
///
/// # Errors
///
/// Returns the invalid fields with a message for each.
pub fn validate_checkout(request: &CheckoutRequest) -> Result<ValidCheckout, FieldErrors> {
    let mut errors = FieldErrors::new();

    if request.items.is_empty() {
        errors.insert("items".to_string(), "cart is empty".to_string());
    }
    for (index, line) in request.items.iter().enumerate() {
        if !(1..=MAX_QUANTITY).contains(&line.quantity) {
            errors.insert(
                format!("items[{index}].quantity"),
                format!("quantity must be between 1 and {MAX_QUANTITY}"),
            );
        }
    }

    if !request.terms_accepted {
        errors.insert(
            "terms_accepted".to_string(),
            "terms and conditions must be accepted".to_string(),
        );
    }

    let notes = request
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from);
    if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTE_LENGTH) {
        errors.insert(
            "notes".to_string(),
            format!("note must be at most {MAX_NOTE_LENGTH} characters"),
        );
    }

    let customer = validate_customer(&request.customer, &mut errors);

    match customer {
        Some(customer) if errors.is_empty() => Ok(ValidCheckout {
            customer,
            items: request
                .items
                .iter()
                .map(|line| LineItem {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .collect(),
            payment_method: request.payment_method,
            notes,
        }),
        _ => Err(errors),
    }
}

fn validate_customer(input: &CustomerInput, errors: &mut FieldErrors) -> Option<Customer> {
    let first_name = required(&input.first_name, "customer.first_name", errors);
    let last_name = required(&input.last_name, "customer.last_name", errors);
    let street = required(&input.street, "customer.street", errors);
    let house_number = required(&input.house_number, "customer.house_number", errors);
    let city = required(&input.city, "customer.city", errors);

    let email = Email::parse(&input.email)
        .map_err(|e| {
            errors.insert("customer.email".to_string(), e.to_string());
        })
        .ok();

    let phone = normalize_phone(&input.phone);
    let phone = if PHONE_RE.is_match(&phone) {
        Some(phone)
    } else {
        errors.insert(
            "customer.phone".to_string(),
            "enter a valid Dutch phone number".to_string(),
        );
        None
    };

    let postal_code = PostalCode::parse(&input.postal_code)
        .map_err(|e| {
            errors.insert("customer.postal_code".to_string(), e.to_string());
        })
        .ok();

    let suffix = input
        .house_number_suffix
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();

    Some(Customer {
        first_name: first_name?,
        last_name: last_name?,
        company: input
            .company
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from),
        email: email?,
        phone: phone?,
        street: street?,
        house_number: format!("{}{suffix}", house_number?),
        postal_code: postal_code?,
        city: city?,
    })
}

fn required(value: &str, field: &str, errors: &mut FieldErrors) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        errors.insert(field.to_string(), "required".to_string());
        None
    } else {
        Some(value.to_string())
    }
}

fn normalize_phone(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

//! Client-side validation of mutation payloads, run before any network call.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::money::Amount;

/// One inline form error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Implemented by every create/update payload
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

pub fn require_text(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(field, "is required");
    }
}

pub fn optional_text(errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        require_text(errors, field, value);
    }
}

/// Amount must be a finite, non-negative decimal
pub fn require_amount(errors: &mut ValidationErrors, field: &str, amount: &Amount) {
    if amount.is_blank() {
        errors.push(field, "is required");
        return;
    }
    match amount.try_value() {
        None => errors.push(field, "must be a number"),
        Some(value) if value < Decimal::ZERO => errors.push(field, "must not be negative"),
        Some(_) => {}
    }
}

pub fn optional_amount(errors: &mut ValidationErrors, field: &str, amount: Option<&Amount>) {
    if let Some(amount) = amount {
        require_amount(errors, field, amount);
    }
}

pub fn optional_email(errors: &mut ValidationErrors, field: &str, email: Option<&str>) {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return;
    };
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => errors.push(field, "is not a valid email address"),
    }
}

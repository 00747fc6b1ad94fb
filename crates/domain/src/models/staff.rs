use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use crate::{
    aggregates::Searchable,
    money::Amount,
    validation::{
        Validate, ValidationErrors, optional_amount, optional_email, optional_text, require_text,
    },
};

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StaffRole {
    #[default]
    Pr,
    Bartender,
    Security,
    Cashier,
    Manager,
    #[serde(other)]
    Other,
}

/// PR or staff member working the events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffProfile {
    pub id: Uuid,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub role: StaffRole,
    /// Percentage of ticket sales credited to a PR
    #[serde(default)]
    pub commission_rate: Amount,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl StaffProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaffProfile {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: StaffRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<Amount>,
    pub is_active: bool,
}

impl Default for CreateStaffProfile {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: None,
            phone: None,
            role: StaffRole::default(),
            commission_rate: None,
            is_active: true,
        }
    }
}

impl From<&StaffProfile> for CreateStaffProfile {
    fn from(profile: &StaffProfile) -> Self {
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            role: profile.role,
            commission_rate: (!profile.commission_rate.is_blank())
                .then(|| profile.commission_rate.clone()),
            is_active: profile.is_active,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaffProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<StaffRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl From<CreateStaffProfile> for UpdateStaffProfile {
    fn from(form: CreateStaffProfile) -> Self {
        Self {
            first_name: Some(form.first_name),
            last_name: Some(form.last_name),
            email: form.email,
            phone: form.phone,
            role: Some(form.role),
            commission_rate: form.commission_rate,
            is_active: Some(form.is_active),
        }
    }
}

fn check_commission(errors: &mut ValidationErrors, rate: Option<&Amount>) {
    optional_amount(errors, "commissionRate", rate);
    if let Some(value) = rate.and_then(Amount::try_value) {
        if value > rust_decimal::Decimal::ONE_HUNDRED {
            errors.push("commissionRate", "must be at most 100");
        }
    }
}

impl Validate for CreateStaffProfile {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "firstName", &self.first_name);
        require_text(&mut errors, "lastName", &self.last_name);
        optional_email(&mut errors, "email", self.email.as_deref());
        check_commission(&mut errors, self.commission_rate.as_ref());
        errors.into_result()
    }
}

impl Validate for UpdateStaffProfile {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        optional_text(&mut errors, "firstName", self.first_name.as_deref());
        optional_text(&mut errors, "lastName", self.last_name.as_deref());
        optional_email(&mut errors, "email", self.email.as_deref());
        check_commission(&mut errors, self.commission_rate.as_ref());
        errors.into_result()
    }
}

impl Searchable for StaffProfile {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.first_name.as_str(), self.last_name.as_str()];
        fields.extend(self.email.as_deref());
        fields.extend(self.phone.as_deref());
        fields
    }
}

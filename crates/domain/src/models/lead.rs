use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use crate::{
    aggregates::Searchable,
    validation::{Validate, ValidationErrors, optional_email, optional_text, require_text},
};

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Converted,
    Lost,
    #[serde(other)]
    Other,
}

/// Contact collected through a landing page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    /// Landing page that captured the lead
    pub landing_page_id: Option<Uuid>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub status: LeadStatus,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Lead {
    pub fn full_name(&self) -> String {
        match self.last_name.as_deref().filter(|l| !l.trim().is_empty()) {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateLead {
    pub landing_page_id: Option<Uuid>,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub status: LeadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&Lead> for CreateLead {
    fn from(lead: &Lead) -> Self {
        Self {
            landing_page_id: lead.landing_page_id,
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            status: lead.status,
            notes: lead.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLead {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing_page_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<CreateLead> for UpdateLead {
    fn from(form: CreateLead) -> Self {
        Self {
            landing_page_id: form.landing_page_id,
            first_name: Some(form.first_name),
            last_name: form.last_name,
            email: form.email,
            phone: form.phone,
            status: Some(form.status),
            notes: form.notes,
        }
    }
}

impl Validate for CreateLead {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "firstName", &self.first_name);
        optional_email(&mut errors, "email", self.email.as_deref());
        let has_contact = [self.email.as_deref(), self.phone.as_deref()]
            .into_iter()
            .flatten()
            .any(|c| !c.trim().is_empty());
        if !has_contact {
            errors.push("email", "an email or a phone number is required");
        }
        errors.into_result()
    }
}

impl Validate for UpdateLead {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        optional_text(&mut errors, "firstName", self.first_name.as_deref());
        optional_email(&mut errors, "email", self.email.as_deref());
        errors.into_result()
    }
}

impl Searchable for Lead {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.first_name.as_str()];
        fields.extend(self.last_name.as_deref());
        fields.extend(self.email.as_deref());
        fields.extend(self.phone.as_deref());
        fields.extend(self.notes.as_deref());
        fields
    }
}

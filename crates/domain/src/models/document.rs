use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use crate::{
    aggregates::Searchable,
    money::Amount,
    validation::{Validate, ValidationErrors, optional_amount, optional_text, require_amount, require_text},
};

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DocumentType {
    #[default]
    Invoice,
    Receipt,
    Contract,
    Quote,
    #[serde(other)]
    Other,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
    Display,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
    Cancelled,
    #[serde(other)]
    Other,
}

impl DocumentStatus {
    /// Statuses still waiting for a payment
    pub const OUTSTANDING: [DocumentStatus; 2] = [DocumentStatus::Pending, DocumentStatus::Overdue];
}

/// Invoice, receipt or contract attached to the accounting section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountingDocument {
    pub id: Uuid,
    pub location_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    #[serde(rename = "type", default, deserialize_with = "super::null_as_default")]
    pub document_type: DocumentType,
    pub number: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub title: String,
    #[serde(default)]
    pub amount: Amount,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub status: DocumentStatus,
    pub file_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountingDocument {
    pub location_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub title: String,
    pub amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&AccountingDocument> for CreateAccountingDocument {
    fn from(doc: &AccountingDocument) -> Self {
        Self {
            location_id: doc.location_id,
            event_id: doc.event_id,
            document_type: doc.document_type,
            number: doc.number.clone(),
            title: doc.title.clone(),
            amount: doc.amount.clone(),
            issue_date: doc.issue_date,
            due_date: doc.due_date,
            status: doc.status,
            file_url: doc.file_url.clone(),
            notes: doc.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountingDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DocumentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<CreateAccountingDocument> for UpdateAccountingDocument {
    fn from(form: CreateAccountingDocument) -> Self {
        Self {
            location_id: form.location_id,
            event_id: form.event_id,
            document_type: Some(form.document_type),
            number: form.number,
            title: Some(form.title),
            amount: Some(form.amount),
            issue_date: form.issue_date,
            due_date: form.due_date,
            status: Some(form.status),
            file_url: form.file_url,
            notes: form.notes,
        }
    }
}

impl Validate for CreateAccountingDocument {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "title", &self.title);
        require_amount(&mut errors, "amount", &self.amount);
        if let (Some(issued), Some(due)) = (self.issue_date, self.due_date) {
            if due < issued {
                errors.push("dueDate", "must not be before the issue date");
            }
        }
        errors.into_result()
    }
}

impl Validate for UpdateAccountingDocument {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        optional_text(&mut errors, "title", self.title.as_deref());
        optional_amount(&mut errors, "amount", self.amount.as_ref());
        errors.into_result()
    }
}

impl Searchable for AccountingDocument {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        fields.extend(self.number.as_deref());
        fields.extend(self.notes.as_deref());
        fields
    }
}

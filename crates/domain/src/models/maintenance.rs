use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use crate::{
    aggregates::Searchable,
    money::Amount,
    validation::{Validate, ValidationErrors, optional_amount, optional_text, require_text},
};

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MaintenanceType {
    #[default]
    Ordinary,
    Extraordinary,
    #[serde(other)]
    Other,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MaintenanceStatus {
    #[default]
    Pending,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    #[serde(other)]
    Other,
}

impl MaintenanceStatus {
    /// Statuses that still need someone to act on them
    pub const NEEDS_ACTION: [MaintenanceStatus; 2] =
        [MaintenanceStatus::Pending, MaintenanceStatus::Scheduled];

    pub fn needs_action(&self) -> bool {
        Self::NEEDS_ACTION.contains(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Maintenance {
    pub id: Uuid,
    pub location_id: Option<Uuid>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "super::null_as_default")]
    pub maintenance_type: MaintenanceType,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub status: MaintenanceStatus,
    #[serde(default)]
    pub estimated_cost: Amount,
    #[serde(default)]
    pub actual_cost: Amount,
    pub scheduled_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    pub supplier: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaintenance {
    pub location_id: Option<Uuid>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub maintenance_type: MaintenanceType,
    pub status: MaintenanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_cost: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn non_blank(amount: &Amount) -> Option<Amount> {
    (!amount.is_blank()).then(|| amount.clone())
}

impl From<&Maintenance> for CreateMaintenance {
    fn from(item: &Maintenance) -> Self {
        Self {
            location_id: item.location_id,
            title: item.title.clone(),
            description: item.description.clone(),
            maintenance_type: item.maintenance_type,
            status: item.status,
            estimated_cost: non_blank(&item.estimated_cost),
            actual_cost: non_blank(&item.actual_cost),
            scheduled_date: item.scheduled_date,
            completed_date: item.completed_date,
            supplier: item.supplier.clone(),
            notes: item.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMaintenance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub maintenance_type: Option<MaintenanceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MaintenanceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_cost: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<CreateMaintenance> for UpdateMaintenance {
    fn from(form: CreateMaintenance) -> Self {
        Self {
            location_id: form.location_id,
            title: Some(form.title),
            description: form.description,
            maintenance_type: Some(form.maintenance_type),
            status: Some(form.status),
            estimated_cost: form.estimated_cost,
            actual_cost: form.actual_cost,
            scheduled_date: form.scheduled_date,
            completed_date: form.completed_date,
            supplier: form.supplier,
            notes: form.notes,
        }
    }
}

impl Validate for CreateMaintenance {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "title", &self.title);
        optional_amount(&mut errors, "estimatedCost", self.estimated_cost.as_ref());
        optional_amount(&mut errors, "actualCost", self.actual_cost.as_ref());
        if self.status == MaintenanceStatus::Completed && self.completed_date.is_none() {
            errors.push("completedDate", "is required for completed maintenances");
        }
        errors.into_result()
    }
}

impl Validate for UpdateMaintenance {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        optional_text(&mut errors, "title", self.title.as_deref());
        optional_amount(&mut errors, "estimatedCost", self.estimated_cost.as_ref());
        optional_amount(&mut errors, "actualCost", self.actual_cost.as_ref());
        errors.into_result()
    }
}

impl Searchable for Maintenance {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str()];
        fields.extend(self.description.as_deref());
        fields.extend(self.supplier.as_deref());
        fields.extend(self.notes.as_deref());
        fields
    }
}

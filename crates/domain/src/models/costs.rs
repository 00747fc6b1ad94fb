use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use crate::{
    aggregates::Searchable,
    money::Amount,
    validation::{
        Validate, ValidationErrors, optional_amount, optional_text, require_amount, require_text,
    },
};

/// Billing cadence of a recurring cost
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CostFrequency {
    Monthly,
    Quarterly,
    Yearly,
    /// Anything the client does not know how to normalise, including a missing value
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FixedCostCategory {
    Rent,
    Utilities,
    Personnel,
    Insurance,
    Licenses,
    Maintenance,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExtraCostCategory {
    Artists,
    Staff,
    Security,
    Equipment,
    Marketing,
    Services,
    #[default]
    #[serde(other)]
    Other,
}

/// Recurring cost of running a venue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FixedCost {
    pub id: Uuid,
    pub location_id: Option<Uuid>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub category: FixedCostCategory,
    #[serde(default)]
    pub amount: Amount,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub frequency: CostFrequency,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// One-off cost, usually tied to a single event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtraCost {
    pub id: Uuid,
    pub location_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub category: ExtraCostCategory,
    #[serde(default)]
    pub amount: Amount,
    pub supplier: Option<String>,
    pub invoice_number: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateFixedCost {
    pub location_id: Option<Uuid>,
    pub name: String,
    pub category: FixedCostCategory,
    pub amount: Amount,
    pub frequency: CostFrequency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Default for CreateFixedCost {
    fn default() -> Self {
        Self {
            location_id: None,
            name: String::new(),
            category: FixedCostCategory::default(),
            amount: Amount::default(),
            frequency: CostFrequency::Monthly,
            start_date: None,
            end_date: None,
            notes: None,
        }
    }
}

impl CreateFixedCost {
    pub fn new(name: impl Into<String>, amount: impl Into<String>, frequency: CostFrequency) -> Self {
        Self {
            name: name.into(),
            amount: Amount::new(amount),
            frequency,
            ..Default::default()
        }
    }
}

impl From<&FixedCost> for CreateFixedCost {
    fn from(cost: &FixedCost) -> Self {
        Self {
            location_id: cost.location_id,
            name: cost.name.clone(),
            category: cost.category,
            amount: cost.amount.clone(),
            frequency: cost.frequency,
            start_date: cost.start_date,
            end_date: cost.end_date,
            notes: cost.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFixedCost {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<FixedCostCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<CostFrequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<CreateFixedCost> for UpdateFixedCost {
    fn from(form: CreateFixedCost) -> Self {
        Self {
            location_id: form.location_id,
            name: Some(form.name),
            category: Some(form.category),
            amount: Some(form.amount),
            frequency: Some(form.frequency),
            start_date: form.start_date,
            end_date: form.end_date,
            notes: form.notes,
        }
    }
}

fn check_frequency(errors: &mut ValidationErrors, frequency: CostFrequency) {
    if frequency == CostFrequency::Unknown {
        errors.push("frequency", "must be monthly, quarterly or yearly");
    }
}

fn check_period(errors: &mut ValidationErrors, start: Option<NaiveDate>, end: Option<NaiveDate>) {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            errors.push("endDate", "must not be before the start date");
        }
    }
}

impl Validate for CreateFixedCost {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", &self.name);
        require_amount(&mut errors, "amount", &self.amount);
        check_frequency(&mut errors, self.frequency);
        check_period(&mut errors, self.start_date, self.end_date);
        errors.into_result()
    }
}

impl Validate for UpdateFixedCost {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        optional_text(&mut errors, "name", self.name.as_deref());
        optional_amount(&mut errors, "amount", self.amount.as_ref());
        if let Some(frequency) = self.frequency {
            check_frequency(&mut errors, frequency);
        }
        check_period(&mut errors, self.start_date, self.end_date);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateExtraCost {
    pub location_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub name: String,
    pub category: ExtraCostCategory,
    pub amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CreateExtraCost {
    pub fn new(name: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: Amount::new(amount),
            ..Default::default()
        }
    }
}

impl From<&ExtraCost> for CreateExtraCost {
    fn from(cost: &ExtraCost) -> Self {
        Self {
            location_id: cost.location_id,
            event_id: cost.event_id,
            name: cost.name.clone(),
            category: cost.category,
            amount: cost.amount.clone(),
            supplier: cost.supplier.clone(),
            invoice_number: cost.invoice_number.clone(),
            payment_date: cost.payment_date,
            notes: cost.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExtraCost {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ExtraCostCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<CreateExtraCost> for UpdateExtraCost {
    fn from(form: CreateExtraCost) -> Self {
        Self {
            location_id: form.location_id,
            event_id: form.event_id,
            name: Some(form.name),
            category: Some(form.category),
            amount: Some(form.amount),
            supplier: form.supplier,
            invoice_number: form.invoice_number,
            payment_date: form.payment_date,
            notes: form.notes,
        }
    }
}

impl Validate for CreateExtraCost {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", &self.name);
        require_amount(&mut errors, "amount", &self.amount);
        errors.into_result()
    }
}

impl Validate for UpdateExtraCost {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        optional_text(&mut errors, "name", self.name.as_deref());
        optional_amount(&mut errors, "amount", self.amount.as_ref());
        errors.into_result()
    }
}

impl Searchable for FixedCost {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.notes.as_deref());
        fields
    }
}

impl Searchable for ExtraCost {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.supplier.as_deref());
        fields.extend(self.invoice_number.as_deref());
        fields.extend(self.notes.as_deref());
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_frequency_deserializes() {
        let cost: FixedCost = serde_json::from_value(serde_json::json!({
            "id": "6f1c1a52-9d0b-4d7e-9a57-0c0d1b8f2a11",
            "locationId": null,
            "name": "SIAE",
            "amount": "80.00",
            "frequency": "biweekly",
        }))
        .unwrap();
        assert_eq!(cost.frequency, CostFrequency::Unknown);
        assert_eq!(cost.category, FixedCostCategory::Other);
    }

    #[test]
    fn test_null_or_missing_fields_do_not_fail_the_list() {
        let costs: Vec<FixedCost> = serde_json::from_str(
            r#"[
                {"id":"6f1c1a52-9d0b-4d7e-9a57-0c0d1b8f2a11","name":"Affitto","amount":"300","frequency":"monthly"},
                {"id":"6f1c1a52-9d0b-4d7e-9a57-0c0d1b8f2a12","name":"SIAE","amount":"80","frequency":null},
                {"id":"6f1c1a52-9d0b-4d7e-9a57-0c0d1b8f2a13","name":null,"category":null,"amount":"40"}
            ]"#,
        )
        .unwrap();

        assert_eq!(costs.len(), 3);
        assert_eq!(costs[1].frequency, CostFrequency::Unknown);
        assert_eq!(costs[2].frequency, CostFrequency::Unknown);
        assert_eq!(costs[2].name, "");
        assert_eq!(costs[2].category, FixedCostCategory::Other);
        assert_eq!(
            crate::aggregates::monthly_fixed_cost_total(&costs),
            rust_decimal::Decimal::from(300)
        );

        let extra: Vec<ExtraCost> = serde_json::from_str(
            r#"[{"id":"6f1c1a52-9d0b-4d7e-9a57-0c0d1b8f2a14","name":null,"category":null,"amount":null}]"#,
        )
        .unwrap();
        assert_eq!(extra[0].category, ExtraCostCategory::Other);
    }

    #[test]
    fn test_create_fixed_cost_validation() {
        let ok = CreateFixedCost::new("Affitto", "2500", CostFrequency::Monthly);
        assert!(ok.validate().is_ok());

        let bad = CreateFixedCost {
            name: " ".to_string(),
            amount: Amount::new("tanti"),
            frequency: CostFrequency::Unknown,
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.for_field("endDate").is_some());
    }

    #[test]
    fn test_update_from_form_serializes_only_present_fields() {
        let update = UpdateExtraCost::from(CreateExtraCost::new("DJ", "600"));
        let json = serde_json::to_value(&update).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.get("name").unwrap(), "DJ");
        assert_eq!(object.get("amount").unwrap(), "600");
        assert!(!object.contains_key("supplier"));
        assert!(!object.contains_key("eventId"));
    }
}

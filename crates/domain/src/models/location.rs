use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{
    aggregates::Searchable,
    validation::{Validate, ValidationErrors, optional_text, require_text},
};

/// Venue that costs, maintenances and events refer to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub capacity: Option<u32>,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

fn null_as_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    pub is_active: bool,
}

impl Default for CreateLocation {
    fn default() -> Self {
        Self {
            name: String::new(),
            address: None,
            city: None,
            capacity: None,
            is_active: true,
        }
    }
}

impl From<&Location> for CreateLocation {
    fn from(location: &Location) -> Self {
        Self {
            name: location.name.clone(),
            address: location.address.clone(),
            city: location.city.clone(),
            capacity: location.capacity,
            is_active: location.is_active,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl From<CreateLocation> for UpdateLocation {
    fn from(form: CreateLocation) -> Self {
        Self {
            name: Some(form.name),
            address: form.address,
            city: form.city,
            capacity: form.capacity,
            is_active: Some(form.is_active),
        }
    }
}

impl Validate for CreateLocation {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", &self.name);
        if self.capacity == Some(0) {
            errors.push("capacity", "must be greater than zero");
        }
        errors.into_result()
    }
}

impl Validate for UpdateLocation {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        optional_text(&mut errors, "name", self.name.as_deref());
        if self.capacity == Some(0) {
            errors.push("capacity", "must be greater than zero");
        }
        errors.into_result()
    }
}

impl Searchable for Location {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.address.as_deref());
        fields.extend(self.city.as_deref());
        fields
    }
}

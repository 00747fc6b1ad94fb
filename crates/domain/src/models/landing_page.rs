use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    aggregates::Searchable,
    validation::{Validate, ValidationErrors, optional_text, require_text},
};

/// Public event page collecting leads
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LandingPage {
    pub id: Uuid,
    pub event_id: Option<Uuid>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub title: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub views: u64,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub lead_count: u64,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateLandingPage {
    pub event_id: Option<Uuid>,
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
}

impl From<&LandingPage> for CreateLandingPage {
    fn from(page: &LandingPage) -> Self {
        Self {
            event_id: page.event_id,
            slug: page.slug.clone(),
            title: page.title.clone(),
            description: page.description.clone(),
            is_active: page.is_active,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLandingPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl From<CreateLandingPage> for UpdateLandingPage {
    fn from(form: CreateLandingPage) -> Self {
        Self {
            event_id: form.event_id,
            slug: Some(form.slug),
            title: Some(form.title),
            description: form.description,
            is_active: Some(form.is_active),
        }
    }
}

/// Slugs end up in public URLs: lowercase ascii, digits and single dashes only
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn check_slug(errors: &mut ValidationErrors, slug: &str) {
    if slug.trim().is_empty() {
        errors.push("slug", "is required");
    } else if !is_valid_slug(slug) {
        errors.push("slug", "may only contain lowercase letters, digits and dashes");
    }
}

impl Validate for CreateLandingPage {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_slug(&mut errors, &self.slug);
        require_text(&mut errors, "title", &self.title);
        errors.into_result()
    }
}

impl Validate for UpdateLandingPage {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(slug) = &self.slug {
            check_slug(&mut errors, slug);
        }
        optional_text(&mut errors, "title", self.title.as_deref());
        errors.into_result()
    }
}

impl Searchable for LandingPage {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.slug.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }
}

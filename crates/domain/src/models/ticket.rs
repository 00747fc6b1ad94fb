use chrono::{DateTime, Utc};
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
pub enum TicketStatus {
    #[default]
    Valid,
    Used,
    Cancelled,
    Refunded,
    #[serde(other)]
    Other,
}

impl TicketStatus {
    /// Tickets whose price counts as revenue
    pub const PAID: [TicketStatus; 2] = [TicketStatus::Valid, TicketStatus::Used];
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub event_id: Uuid,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub ticket_code: String,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub ticket_type: String,
    #[serde(default)]
    pub price: Amount,
    #[serde(default, deserialize_with = "super::null_as_default")]
    pub status: TicketStatus,
    pub holder_name: Option<String>,
    pub purchased_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicket {
    pub event_id: Uuid,
    pub ticket_type: String,
    pub price: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_name: Option<String>,
}

impl From<&Ticket> for CreateTicket {
    fn from(ticket: &Ticket) -> Self {
        Self {
            event_id: ticket.event_id,
            ticket_type: ticket.ticket_type.clone(),
            price: ticket.price.clone(),
            holder_name: ticket.holder_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicket {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_name: Option<String>,
}

impl From<CreateTicket> for UpdateTicket {
    fn from(form: CreateTicket) -> Self {
        Self {
            ticket_type: Some(form.ticket_type),
            price: Some(form.price),
            status: None,
            holder_name: form.holder_name,
        }
    }
}

impl Validate for CreateTicket {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.event_id.is_nil() {
            errors.push("eventId", "is required");
        }
        require_text(&mut errors, "ticketType", &self.ticket_type);
        require_amount(&mut errors, "price", &self.price);
        errors.into_result()
    }
}

impl Validate for UpdateTicket {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        optional_text(&mut errors, "ticketType", self.ticket_type.as_deref());
        optional_amount(&mut errors, "price", self.price.as_ref());
        errors.into_result()
    }
}

impl Searchable for Ticket {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.ticket_code.as_str(), self.ticket_type.as_str()];
        fields.extend(self.holder_name.as_deref());
        fields
    }
}

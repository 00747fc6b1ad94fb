//! REST resources exposed by the backend and the keys they own.

use std::fmt::Debug;

use domain::{
    Validate,
    models::{
        costs::{
            CreateExtraCost, CreateFixedCost, ExtraCost, FixedCost, UpdateExtraCost,
            UpdateFixedCost,
        },
        document::{AccountingDocument, CreateAccountingDocument, UpdateAccountingDocument},
        landing_page::{CreateLandingPage, LandingPage, UpdateLandingPage},
        lead::{CreateLead, Lead, UpdateLead},
        location::{CreateLocation, Location, UpdateLocation},
        maintenance::{CreateMaintenance, Maintenance, UpdateMaintenance},
        staff::{CreateStaffProfile, StaffProfile, UpdateStaffProfile},
        ticket::{CreateTicket, Ticket, UpdateTicket},
    },
};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use super::query_key::QueryKey;

pub const ACCOUNTING_STATS_PATH: &str = "/api/accounting/stats";

/// A record type backed by a collection endpoint.
pub trait Resource: DeserializeOwned + Debug + Clone + Send + Sync + 'static {
    /// Payload for POST. Also the form model of the create/edit dialog.
    type Create: Serialize
        + Validate
        + Debug
        + Clone
        + Default
        + Send
        + Sync
        + for<'a> From<&'a Self>
        + 'static;
    /// Partial payload for PATCH
    type Update: Serialize + Validate + Debug + Send + Sync + From<Self::Create> + 'static;

    /// Collection endpoint, e.g. `/api/fixed-costs`
    const PATH: &'static str;
    /// Human label used in notifications
    const LABEL: &'static str;

    fn id(&self) -> Uuid;

    fn list_key() -> QueryKey {
        QueryKey::new(Self::PATH)
    }

    fn record_key(id: Uuid) -> QueryKey {
        Self::list_key().child(id)
    }

    /// Other reads whose server-side value is computed from this collection.
    fn dependent_keys() -> Vec<QueryKey> {
        Vec::new()
    }
}

pub fn accounting_stats_key() -> QueryKey {
    QueryKey::new(ACCOUNTING_STATS_PATH)
}

impl Resource for FixedCost {
    type Create = CreateFixedCost;
    type Update = UpdateFixedCost;
    const PATH: &'static str = "/api/fixed-costs";
    const LABEL: &'static str = "Fixed cost";

    fn id(&self) -> Uuid {
        self.id
    }

    fn dependent_keys() -> Vec<QueryKey> {
        vec![accounting_stats_key()]
    }
}

impl Resource for ExtraCost {
    type Create = CreateExtraCost;
    type Update = UpdateExtraCost;
    const PATH: &'static str = "/api/extra-costs";
    const LABEL: &'static str = "Extra cost";

    fn id(&self) -> Uuid {
        self.id
    }

    fn dependent_keys() -> Vec<QueryKey> {
        vec![accounting_stats_key()]
    }
}

impl Resource for Maintenance {
    type Create = CreateMaintenance;
    type Update = UpdateMaintenance;
    const PATH: &'static str = "/api/maintenances";
    const LABEL: &'static str = "Maintenance";

    fn id(&self) -> Uuid {
        self.id
    }

    fn dependent_keys() -> Vec<QueryKey> {
        vec![accounting_stats_key()]
    }
}

impl Resource for AccountingDocument {
    type Create = CreateAccountingDocument;
    type Update = UpdateAccountingDocument;
    const PATH: &'static str = "/api/accounting-documents";
    const LABEL: &'static str = "Document";

    fn id(&self) -> Uuid {
        self.id
    }

    fn dependent_keys() -> Vec<QueryKey> {
        vec![accounting_stats_key()]
    }
}

impl Resource for LandingPage {
    type Create = CreateLandingPage;
    type Update = UpdateLandingPage;
    const PATH: &'static str = "/api/landing-pages";
    const LABEL: &'static str = "Landing page";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Resource for Lead {
    type Create = CreateLead;
    type Update = UpdateLead;
    const PATH: &'static str = "/api/leads";
    const LABEL: &'static str = "Lead";

    fn id(&self) -> Uuid {
        self.id
    }

    // Landing pages carry a lead counter.
    fn dependent_keys() -> Vec<QueryKey> {
        vec![LandingPage::list_key()]
    }
}

impl Resource for Ticket {
    type Create = CreateTicket;
    type Update = UpdateTicket;
    const PATH: &'static str = "/api/tickets";
    const LABEL: &'static str = "Ticket";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Resource for StaffProfile {
    type Create = CreateStaffProfile;
    type Update = UpdateStaffProfile;
    const PATH: &'static str = "/api/staff";
    const LABEL: &'static str = "Staff member";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Resource for Location {
    type Create = CreateLocation;
    type Update = UpdateLocation;
    const PATH: &'static str = "/api/locations";
    const LABEL: &'static str = "Location";

    fn id(&self) -> Uuid {
        self.id
    }
}

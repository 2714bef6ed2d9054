use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::{Entity, Patch};
use crate::validation::{BodySchema, FieldKind, FieldRule};

const SPONSOR_FIELD: FieldKind = FieldKind::Text { max_len: 255 };

/// A sponsor's entitlement. Active once `activated_at` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entitlement {
    pub id: Uuid,
    pub sponsor_name: String,
    /// Vendor account number.
    pub sponsor_external_id: String,
    /// Cloud container the sponsor pays for: Azure subscription, AWS
    /// account number, GCP project id.
    pub sponsor_container_id: String,
    pub activated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Entitlement {
    const NAME: &'static str = "Entitlement";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntitlementCreate {
    pub sponsor_name: String,
    pub sponsor_external_id: String,
    pub sponsor_container_id: String,
}

impl BodySchema for EntitlementCreate {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required("sponsor_name", SPONSOR_FIELD),
        FieldRule::required("sponsor_external_id", SPONSOR_FIELD),
        FieldRule::required("sponsor_container_id", SPONSOR_FIELD),
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EntitlementPatch {
    pub sponsor_name: Patch<String>,
    pub sponsor_external_id: Patch<String>,
    pub sponsor_container_id: Patch<String>,
    pub activated_at: Patch<Option<DateTime<Utc>>>,
}

impl EntitlementPatch {
    pub fn is_empty(&self) -> bool {
        !(self.sponsor_name.is_set()
            || self.sponsor_external_id.is_set()
            || self.sponsor_container_id.is_set()
            || self.activated_at.is_set())
    }

    pub fn apply_to(self, entitlement: &mut Entitlement) {
        self.sponsor_name.apply(&mut entitlement.sponsor_name);
        self.sponsor_external_id
            .apply(&mut entitlement.sponsor_external_id);
        self.sponsor_container_id
            .apply(&mut entitlement.sponsor_container_id);
        self.activated_at.apply(&mut entitlement.activated_at);
    }
}

impl BodySchema for EntitlementPatch {
    const RULES: &'static [FieldRule] = &[
        FieldRule::optional("sponsor_name", SPONSOR_FIELD),
        FieldRule::optional("sponsor_external_id", SPONSOR_FIELD),
        FieldRule::optional("sponsor_container_id", SPONSOR_FIELD),
        FieldRule::optional("activated_at", FieldKind::Timestamp).nullable(),
    ];
}

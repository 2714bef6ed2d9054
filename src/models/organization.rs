use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::{Entity, Patch};
use crate::validation::{BodySchema, FieldKind, FieldRule};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub external_id: String,
    /// Primary currency for financial operations, e.g. `USD`.
    pub currency: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Organization {
    const NAME: &'static str = "Organization";

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrganizationCreate {
    pub name: String,
    pub external_id: String,
    #[serde(default)]
    pub currency: Option<String>,
}

impl BodySchema for OrganizationCreate {
    const RULES: &'static [FieldRule] = &[
        FieldRule::required("name", FieldKind::Text { max_len: 255 }),
        FieldRule::required("external_id", FieldKind::Text { max_len: 255 }),
        FieldRule::optional("currency", FieldKind::CurrencyCode).nullable(),
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrganizationPatch {
    pub name: Patch<String>,
    pub external_id: Patch<String>,
    pub currency: Patch<Option<String>>,
}

impl OrganizationPatch {
    pub fn is_empty(&self) -> bool {
        !(self.name.is_set() || self.external_id.is_set() || self.currency.is_set())
    }

    pub fn apply_to(self, organization: &mut Organization) {
        self.name.apply(&mut organization.name);
        self.external_id.apply(&mut organization.external_id);
        self.currency.apply(&mut organization.currency);
    }
}

impl BodySchema for OrganizationPatch {
    const RULES: &'static [FieldRule] = &[
        FieldRule::optional("name", FieldKind::Text { max_len: 255 }),
        FieldRule::optional("external_id", FieldKind::Text { max_len: 255 }),
        FieldRule::optional("currency", FieldKind::CurrencyCode).nullable(),
    ];
}

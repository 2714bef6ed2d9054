mod entitlement;
mod organization;
mod patch;
pub mod timestamp;

pub use entitlement::{Entitlement, EntitlementCreate, EntitlementPatch};
pub use organization::{Organization, OrganizationCreate, OrganizationPatch};
pub use patch::Patch;

use uuid::Uuid;

/// A persisted record with a server-assigned identity.
pub trait Entity {
    /// Human readable type name used in error messages.
    const NAME: &'static str;

    fn id(&self) -> Uuid;
}

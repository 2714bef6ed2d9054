//! HTTP-facing wrapper around a [`Repository`].
//!
//! This is the one place a storage-level "not found" becomes a 404.

use uuid::Uuid;

use crate::{
    models::Entity,
    repository::{Page, Pagination, Repository},
    rest::ApiError,
    storage::StorageError,
};

pub struct Collection<R> {
    repository: R,
}

impl<R: Repository> Collection<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn get(&self, id: Uuid) -> Result<R::Entity, ApiError> {
        self.repository.get(id).map_err(into_api_error)
    }

    pub fn fetch_page(&self, pagination: Pagination) -> Result<Page<R::Entity>, ApiError> {
        self.repository
            .fetch_page(pagination)
            .map_err(into_api_error)
    }

    pub fn create(&self, payload: R::Create) -> Result<R::Entity, ApiError> {
        let created = self.repository.create(payload).map_err(into_api_error)?;
        log::info!("Created {} {}", <R::Entity as Entity>::NAME, created.id());
        Ok(created)
    }

    pub fn update(&self, id: Uuid, patch: R::Patch) -> Result<R::Entity, ApiError> {
        let existing = self.get(id)?;
        let updated = self
            .repository
            .update(existing, patch)
            .map_err(into_api_error)?;
        log::debug!("Updated {} {}", <R::Entity as Entity>::NAME, updated.id());
        Ok(updated)
    }
}

fn into_api_error(err: StorageError) -> ApiError {
    match err {
        err @ StorageError::NotFound { .. } => ApiError::NotFound(err.to_string()),
        other => ApiError::internal(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{EntitlementCreate, EntitlementPatch, Patch},
        repository::EntitlementRepository,
        storage::SqliteStorage,
    };
    use axum::http::StatusCode;
    use tempfile::TempDir;

    fn storage() -> (TempDir, SqliteStorage) {
        let dir = TempDir::new().unwrap();
        let storage = SqliteStorage::in_dir(dir.path());
        storage.init().unwrap();
        (dir, storage)
    }

    #[test]
    fn get_missing_entity_is_a_404_naming_the_id() {
        let (_dir, storage) = storage();
        let session = storage.session().unwrap();
        let entitlements = Collection::new(EntitlementRepository::new(&session));

        let id = Uuid::new_v4();
        let err = entitlements.get(id).unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            err.to_string(),
            format!("Entitlement with ID {id} wasn't found")
        );
    }

    #[test]
    fn update_missing_entity_is_a_404() {
        let (_dir, storage) = storage();
        let session = storage.session().unwrap();
        let entitlements = Collection::new(EntitlementRepository::new(&session));

        let patch = EntitlementPatch {
            sponsor_name: Patch::Set("GCP".into()),
            ..Default::default()
        };
        let err = entitlements.update(Uuid::new_v4(), patch).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn create_then_update_through_collection() {
        let (_dir, storage) = storage();
        let session = storage.session().unwrap();
        let entitlements = Collection::new(EntitlementRepository::new(&session));

        let created = entitlements
            .create(EntitlementCreate {
                sponsor_name: "AWS".into(),
                sponsor_external_id: "EXTERNAL_ID_987123".into(),
                sponsor_container_id: "SPONSOR_CONTAINER_ID_1234".into(),
            })
            .unwrap();

        let updated = entitlements
            .update(
                created.id,
                EntitlementPatch {
                    sponsor_name: Patch::Set("GCP".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.sponsor_name, "GCP");
        assert_eq!(entitlements.get(created.id).unwrap(), updated);

        let page = entitlements.fetch_page(Pagination::default()).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items, vec![updated]);
    }
}

//! Motorbike fleet management.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{
    validate_photo_urls, Motorbike, MotorbikeChanges, MotorbikePhoto, MotorbikeStatus,
    NewMotorbike,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait MotorbikeService: Send + Sync {
    async fn create(&self, input: NewMotorbike) -> AppResult<Motorbike>;

    async fn get(&self, id: i64) -> AppResult<Motorbike>;

    async fn list(&self) -> AppResult<Vec<Motorbike>>;

    async fn list_available(&self) -> AppResult<Vec<Motorbike>>;

    async fn list_in_maintenance(&self) -> AppResult<Vec<Motorbike>>;

    async fn list_rented(&self) -> AppResult<Vec<Motorbike>>;

    async fn update(&self, id: i64, changes: MotorbikeChanges) -> AppResult<Motorbike>;

    /// Rented motorbikes cannot be removed
    async fn delete(&self, id: i64) -> AppResult<()>;

    async fn photos(&self, id: i64) -> AppResult<Vec<MotorbikePhoto>>;
}

fn validate_model(model: &str) -> AppResult<()> {
    if model.trim().is_empty() {
        return Err(AppError::validation("Model is required"));
    }
    Ok(())
}

fn validate_location(latitude: Option<f64>, longitude: Option<f64>) -> AppResult<()> {
    if latitude.is_some_and(|lat| !(-90.0..=90.0).contains(&lat)) {
        return Err(AppError::validation("Latitude must be between -90 and 90"));
    }
    if longitude.is_some_and(|long| !(-180.0..=180.0).contains(&long)) {
        return Err(AppError::validation(
            "Longitude must be between -180 and 180",
        ));
    }
    Ok(())
}

pub struct FleetManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> FleetManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> MotorbikeService for FleetManager<U> {
    async fn create(&self, input: NewMotorbike) -> AppResult<Motorbike> {
        validate_model(&input.model)?;
        validate_location(Some(input.location_latitude), Some(input.location_longitude))?;
        validate_photo_urls(&input.photo_urls)?;

        let bike = self.uow.motorbikes().create(input).await?;
        tracing::info!(motorbike_id = bike.id, model = %bike.model, "Motorbike added");
        Ok(bike)
    }

    async fn get(&self, id: i64) -> AppResult<Motorbike> {
        self.uow
            .motorbikes()
            .find_by_id(id)
            .await?
            .ok_or_not_found("Motorbike")
    }

    async fn list(&self) -> AppResult<Vec<Motorbike>> {
        self.uow.motorbikes().list().await
    }

    async fn list_available(&self) -> AppResult<Vec<Motorbike>> {
        self.uow
            .motorbikes()
            .list_by_status(MotorbikeStatus::Available)
            .await
    }

    async fn list_in_maintenance(&self) -> AppResult<Vec<Motorbike>> {
        self.uow
            .motorbikes()
            .list_by_status(MotorbikeStatus::Maintenance)
            .await
    }

    async fn list_rented(&self) -> AppResult<Vec<Motorbike>> {
        self.uow
            .motorbikes()
            .list_by_status(MotorbikeStatus::Rented)
            .await
    }

    async fn update(&self, id: i64, changes: MotorbikeChanges) -> AppResult<Motorbike> {
        if let Some(model) = &changes.model {
            validate_model(model)?;
        }
        validate_location(changes.location_latitude, changes.location_longitude)?;
        if let Some(urls) = &changes.photo_urls {
            validate_photo_urls(urls)?;
        }

        // Only finishing the ride may release a rented motorbike
        if let Some(status) = changes.status {
            let bike = self.get(id).await?;
            if bike.status == MotorbikeStatus::Rented && status != MotorbikeStatus::Rented {
                return Err(AppError::bad_request(
                    "Cannot change the status of a rented motorbike",
                ));
            }
        }

        self.uow.motorbikes().update(id, changes).await
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let bike = self.get(id).await?;
        if bike.status == MotorbikeStatus::Rented {
            return Err(AppError::bad_request("Cannot delete a rented motorbike"));
        }

        self.uow.motorbikes().delete(id).await?;
        tracing::info!(motorbike_id = id, "Motorbike removed");
        Ok(())
    }

    async fn photos(&self, id: i64) -> AppResult<Vec<MotorbikePhoto>> {
        self.get(id).await?;
        self.uow.motorbikes().photos(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mockall::predicate::eq;

    use crate::domain::LockStatus;
    use crate::infra::{MockMotorbikeRepository, MockPersistence};

    fn bike(id: i64, status: MotorbikeStatus) -> Motorbike {
        let now = Utc::now();
        Motorbike {
            id,
            model: "Vespa".into(),
            location_latitude: 41.0,
            location_longitude: 29.0,
            status,
            lock_status: LockStatus::Locked,
            photos: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    fn new_bike() -> NewMotorbike {
        NewMotorbike {
            model: "Vespa".into(),
            location_latitude: 41.0,
            location_longitude: 29.0,
            status: MotorbikeStatus::Available,
            lock_status: LockStatus::Locked,
            photo_urls: vec!["https://cdn.test/v.jpg".into()],
        }
    }

    fn service(repo: MockMotorbikeRepository) -> FleetManager<MockPersistence> {
        FleetManager::new(Arc::new(MockPersistence::new().with_motorbikes(repo)))
    }

    #[tokio::test]
    async fn test_create_validates_before_insert() {
        let svc = service(MockMotorbikeRepository::new());

        let mut bad_lat = new_bike();
        bad_lat.location_latitude = 91.0;
        assert!(matches!(svc.create(bad_lat).await, Err(AppError::Validation(_))));

        let mut blank = new_bike();
        blank.model = "  ".into();
        assert!(matches!(svc.create(blank).await, Err(AppError::Validation(_))));

        let mut bad_photo = new_bike();
        bad_photo.photo_urls = vec!["file:///etc/passwd".into()];
        assert!(matches!(svc.create(bad_photo).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_inserts_valid_motorbike() {
        let mut repo = MockMotorbikeRepository::new();
        repo.expect_create()
            .times(1)
            .returning(|_| Ok(bike(1, MotorbikeStatus::Available)));

        let created = service(repo).create(new_bike()).await.unwrap();
        assert_eq!(created.id, 1);
    }

    #[tokio::test]
    async fn test_list_available_filters_by_status() {
        let mut repo = MockMotorbikeRepository::new();
        repo.expect_list_by_status()
            .with(eq(MotorbikeStatus::Available))
            .returning(|_| Ok(vec![bike(1, MotorbikeStatus::Available)]));

        let bikes = service(repo).list_available().await.unwrap();
        assert_eq!(bikes.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_rented_motorbike_is_refused() {
        let mut repo = MockMotorbikeRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(bike(id, MotorbikeStatus::Rented))));
        repo.expect_delete().never();

        let result = service(repo).delete(2).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_status_of_rented_motorbike_is_locked_in() {
        let mut repo = MockMotorbikeRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(bike(id, MotorbikeStatus::Rented))));
        repo.expect_update().never();

        let result = service(repo)
            .update(
                2,
                MotorbikeChanges {
                    status: Some(MotorbikeStatus::Maintenance),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_status_change_on_idle_motorbike() {
        let mut repo = MockMotorbikeRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(bike(id, MotorbikeStatus::Available))));
        repo.expect_update()
            .times(1)
            .returning(|id, _| Ok(bike(id, MotorbikeStatus::Maintenance)));

        let updated = service(repo)
            .update(
                1,
                MotorbikeChanges {
                    status: Some(MotorbikeStatus::Maintenance),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, MotorbikeStatus::Maintenance);
    }

    #[tokio::test]
    async fn test_photos_of_missing_motorbike() {
        let mut repo = MockMotorbikeRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let result = service(repo).photos(9).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}

//! Motorbike repository. Photos are stored in their own table and always
//! loaded together with the motorbike.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use super::entities::{motorbike, motorbike_photo};
use crate::domain::{Motorbike, MotorbikeChanges, MotorbikePhoto, MotorbikeStatus, NewMotorbike};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::unit_of_work::run_in_transaction;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait MotorbikeRepository: Send + Sync {
    /// Find motorbike by ID, photos included
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Motorbike>>;

    /// List the whole fleet
    async fn list(&self) -> AppResult<Vec<Motorbike>>;

    /// List motorbikes in the given status
    async fn list_by_status(&self, status: MotorbikeStatus) -> AppResult<Vec<Motorbike>>;

    /// Insert a motorbike and its photos
    async fn create(&self, motorbike: NewMotorbike) -> AppResult<Motorbike>;

    /// Apply changes; a new photo list replaces the old one
    async fn update(&self, id: i64, changes: MotorbikeChanges) -> AppResult<Motorbike>;

    /// Delete motorbike by ID (photos cascade)
    async fn delete(&self, id: i64) -> AppResult<()>;

    /// Photos of one motorbike
    async fn photos(&self, motorbike_id: i64) -> AppResult<Vec<MotorbikePhoto>>;
}

pub struct MotorbikeStore {
    db: DatabaseConnection,
}

impl MotorbikeStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn load<C: ConnectionTrait>(conn: &C, id: i64) -> AppResult<Option<Motorbike>> {
    let rows = motorbike::Entity::find_by_id(id)
        .find_with_related(motorbike_photo::Entity)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .next()
        .map(|(bike, photos)| bike.into_domain(photos)))
}

async fn insert_photos<C: ConnectionTrait>(
    conn: &C,
    motorbike_id: i64,
    urls: Vec<String>,
) -> AppResult<()> {
    if urls.is_empty() {
        return Ok(());
    }

    let now = Utc::now();
    let photos = urls.into_iter().map(|url| motorbike_photo::ActiveModel {
        motorbike_id: Set(motorbike_id),
        photo_url: Set(url),
        created_at: Set(now),
        ..Default::default()
    });

    motorbike_photo::Entity::insert_many(photos)
        .exec(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl MotorbikeRepository for MotorbikeStore {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Motorbike>> {
        load(&self.db, id).await
    }

    async fn list(&self) -> AppResult<Vec<Motorbike>> {
        let rows = motorbike::Entity::find()
            .find_with_related(motorbike_photo::Entity)
            .order_by_asc(motorbike::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(bike, photos)| bike.into_domain(photos))
            .collect())
    }

    async fn list_by_status(&self, status: MotorbikeStatus) -> AppResult<Vec<Motorbike>> {
        let rows = motorbike::Entity::find()
            .filter(motorbike::Column::Status.eq(status.as_str()))
            .find_with_related(motorbike_photo::Entity)
            .order_by_asc(motorbike::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(bike, photos)| bike.into_domain(photos))
            .collect())
    }

    async fn create(&self, new: NewMotorbike) -> AppResult<Motorbike> {
        run_in_transaction(&self.db, move |txn| {
            Box::pin(async move {
                let now = Utc::now();
                let model = motorbike::ActiveModel {
                    model: Set(new.model),
                    location_latitude: Set(new.location_latitude),
                    location_longitude: Set(new.location_longitude),
                    status: Set(new.status.as_str().to_string()),
                    lock_status: Set(new.lock_status.as_str().to_string()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                insert_photos(txn, model.id, new.photo_urls).await?;
                load(txn, model.id).await?.ok_or_not_found("Motorbike")
            })
        })
        .await
    }

    async fn update(&self, id: i64, changes: MotorbikeChanges) -> AppResult<Motorbike> {
        run_in_transaction(&self.db, move |txn| {
            Box::pin(async move {
                let bike = motorbike::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_not_found("Motorbike")?;

                let mut active: motorbike::ActiveModel = bike.into();
                if let Some(model) = changes.model {
                    active.model = Set(model);
                }
                if let Some(lat) = changes.location_latitude {
                    active.location_latitude = Set(lat);
                }
                if let Some(long) = changes.location_longitude {
                    active.location_longitude = Set(long);
                }
                if let Some(status) = changes.status {
                    active.status = Set(status.as_str().to_string());
                }
                if let Some(lock_status) = changes.lock_status {
                    active.lock_status = Set(lock_status.as_str().to_string());
                }
                active.updated_at = Set(Utc::now());
                active.update(txn).await?;

                if let Some(urls) = changes.photo_urls {
                    motorbike_photo::Entity::delete_many()
                        .filter(motorbike_photo::Column::MotorbikeId.eq(id))
                        .exec(txn)
                        .await?;
                    insert_photos(txn, id, urls).await?;
                }

                load(txn, id).await?.ok_or_not_found("Motorbike")
            })
        })
        .await
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let result = motorbike::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("Motorbike"));
        }

        Ok(())
    }

    async fn photos(&self, motorbike_id: i64) -> AppResult<Vec<MotorbikePhoto>> {
        let models = motorbike_photo::Entity::find()
            .filter(motorbike_photo::Column::MotorbikeId.eq(motorbike_id))
            .order_by_asc(motorbike_photo::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(MotorbikePhoto::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_photos_are_mapped_in_order() {
        let now = Utc::now();
        let rows = vec![
            motorbike_photo::Model {
                id: 1,
                motorbike_id: 5,
                photo_url: "https://cdn.test/1.jpg".into(),
                created_at: now,
            },
            motorbike_photo::Model {
                id: 2,
                motorbike_id: 5,
                photo_url: "https://cdn.test/2.jpg".into(),
                created_at: now,
            },
        ];
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows])
            .into_connection();

        let photos = MotorbikeStore::new(db).photos(5).await.unwrap();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[1].photo_url, "https://cdn.test/2.jpg");
    }
}

//! Motorbike database entity.

use sea_orm::entity::prelude::*;

use super::motorbike_photo;
use crate::domain::{LockStatus, Motorbike, MotorbikeStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "motorbikes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub model: String,
    pub location_latitude: f64,
    pub location_longitude: f64,
    pub status: String,
    pub lock_status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::motorbike_photo::Entity")]
    Photos,
}

impl Related<motorbike_photo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Assemble the domain aggregate from the row and its photos.
    pub fn into_domain(self, photos: Vec<motorbike_photo::Model>) -> Motorbike {
        Motorbike {
            id: self.id,
            model: self.model,
            location_latitude: self.location_latitude,
            location_longitude: self.location_longitude,
            status: MotorbikeStatus::from(self.status.as_str()),
            lock_status: LockStatus::from(self.lock_status.as_str()),
            photos: photos.into_iter().map(Into::into).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

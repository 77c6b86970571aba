//! Ride database entity.

use sea_orm::entity::prelude::*;

use crate::domain::Ride;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "rides")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub motorbike_id: i64,
    pub start_time: DateTimeUtc,
    pub end_time: Option<DateTimeUtc>,
    pub duration_seconds: Option<i64>,
    pub cost: Option<f64>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Ride {
    fn from(model: Model) -> Self {
        Ride {
            id: model.id,
            user_id: model.user_id,
            motorbike_id: model.motorbike_id,
            start_time: model.start_time,
            end_time: model.end_time,
            duration_seconds: model.duration_seconds,
            cost: model.cost,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

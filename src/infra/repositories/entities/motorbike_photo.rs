//! Motorbike photo database entity.

use sea_orm::entity::prelude::*;

use crate::domain::MotorbikePhoto;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "motorbike_photos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub motorbike_id: i64,
    pub photo_url: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::motorbike::Entity",
        from = "Column::MotorbikeId",
        to = "super::motorbike::Column::Id",
        on_delete = "Cascade"
    )]
    Motorbike,
}

impl Related<super::motorbike::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Motorbike.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for MotorbikePhoto {
    fn from(model: Model) -> Self {
        MotorbikePhoto {
            id: model.id,
            motorbike_id: model.motorbike_id,
            photo_url: model.photo_url,
            created_at: model.created_at,
        }
    }
}

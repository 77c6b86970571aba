//! Bluetooth connection database entity.

use sea_orm::entity::prelude::*;

use crate::domain::BluetoothConnection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bluetooth_connections")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub motorbike_id: i64,
    pub connected_at: DateTimeUtc,
    pub disconnected_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for BluetoothConnection {
    fn from(model: Model) -> Self {
        BluetoothConnection {
            id: model.id,
            user_id: model.user_id,
            motorbike_id: model.motorbike_id,
            connected_at: model.connected_at,
            disconnected_at: model.disconnected_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

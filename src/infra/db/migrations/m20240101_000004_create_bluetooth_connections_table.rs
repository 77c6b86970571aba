//! Migration: bluetooth connections.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;
use super::m20240101_000002_create_motorbikes_table::Motorbikes;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BluetoothConnections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BluetoothConnections::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BluetoothConnections::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(BluetoothConnections::MotorbikeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BluetoothConnections::ConnectedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BluetoothConnections::DisconnectedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(BluetoothConnections::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(BluetoothConnections::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bluetooth_connections_user")
                            .from(BluetoothConnections::Table, BluetoothConnections::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bluetooth_connections_motorbike")
                            .from(BluetoothConnections::Table, BluetoothConnections::MotorbikeId)
                            .to(Motorbikes::Table, Motorbikes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bluetooth_connections_motorbike_id")
                    .table(BluetoothConnections::Table)
                    .col(BluetoothConnections::MotorbikeId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BluetoothConnections::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum BluetoothConnections {
    Table,
    Id,
    UserId,
    MotorbikeId,
    ConnectedAt,
    DisconnectedAt,
    CreatedAt,
    UpdatedAt,
}

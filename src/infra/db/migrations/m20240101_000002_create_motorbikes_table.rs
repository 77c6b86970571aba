//! Migration: motorbikes and their photos.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Motorbikes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Motorbikes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Motorbikes::Model).string_len(255).not_null())
                    .col(ColumnDef::new(Motorbikes::LocationLatitude).double().not_null())
                    .col(ColumnDef::new(Motorbikes::LocationLongitude).double().not_null())
                    .col(
                        ColumnDef::new(Motorbikes::Status)
                            .string_len(20)
                            .not_null()
                            .default("available"),
                    )
                    .col(
                        ColumnDef::new(Motorbikes::LockStatus)
                            .string_len(10)
                            .not_null()
                            .default("locked"),
                    )
                    .col(
                        ColumnDef::new(Motorbikes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Motorbikes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_motorbikes_status")
                    .table(Motorbikes::Table)
                    .col(Motorbikes::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MotorbikePhotos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MotorbikePhotos::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MotorbikePhotos::MotorbikeId).big_integer().not_null())
                    .col(ColumnDef::new(MotorbikePhotos::PhotoUrl).string_len(255).not_null())
                    .col(
                        ColumnDef::new(MotorbikePhotos::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_motorbike_photos_motorbike")
                            .from(MotorbikePhotos::Table, MotorbikePhotos::MotorbikeId)
                            .to(Motorbikes::Table, Motorbikes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MotorbikePhotos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Motorbikes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(super) enum Motorbikes {
    Table,
    Id,
    Model,
    LocationLatitude,
    LocationLongitude,
    Status,
    LockStatus,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum MotorbikePhotos {
    Table,
    Id,
    MotorbikeId,
    PhotoUrl,
    CreatedAt,
}

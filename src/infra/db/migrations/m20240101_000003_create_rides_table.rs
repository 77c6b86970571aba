//! Migration: rides.

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
                    .table(Rides::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rides::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rides::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Rides::MotorbikeId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Rides::StartTime)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Rides::EndTime).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Rides::DurationSeconds).big_integer().null())
                    .col(ColumnDef::new(Rides::Cost).double().null())
                    .col(
                        ColumnDef::new(Rides::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Rides::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rides_user")
                            .from(Rides::Table, Rides::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rides_motorbike")
                            .from(Rides::Table, Rides::MotorbikeId)
                            .to(Motorbikes::Table, Motorbikes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rides_user_id")
                    .table(Rides::Table)
                    .col(Rides::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rides_motorbike_id")
                    .table(Rides::Table)
                    .col(Rides::MotorbikeId)
                    .to_owned(),
            )
            .await?;

        // At most one unfinished ride per user
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_rides_one_active_per_user \
                 ON rides (user_id) WHERE end_time IS NULL",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rides::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Rides {
    Table,
    Id,
    UserId,
    MotorbikeId,
    StartTime,
    EndTime,
    DurationSeconds,
    Cost,
    CreatedAt,
    UpdatedAt,
}

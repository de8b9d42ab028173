use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WatchJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WatchJobs::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WatchJobs::TravelDate).string().not_null())
                    .col(ColumnDef::new(WatchJobs::FromCode).string().not_null())
                    .col(ColumnDef::new(WatchJobs::ToCode).string().not_null())
                    .col(ColumnDef::new(WatchJobs::Recipients).text().not_null())
                    .col(
                        ColumnDef::new(WatchJobs::IntervalMs)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WatchJobs::MaxInstances)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WatchJobs::Coalesce)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(WatchJobs::NextRunAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(Self::create_timestamp_column(manager, WatchJobs::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_watch_jobs_next_run_at")
                    .table(WatchJobs::Table)
                    .col(WatchJobs::NextRunAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Stations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Stations::Code)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Stations::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Stations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WatchJobs::Table).to_owned())
            .await
    }
}

impl Migration {
    fn create_timestamp_column(
        manager: &SchemaManager<'_>,
        column_name: impl sea_orm::Iden + 'static,
    ) -> ColumnDef {
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => ColumnDef::new(column_name)
                .timestamp_with_time_zone()
                .not_null()
                .to_owned(),
            _ => ColumnDef::new(column_name).timestamp().not_null().to_owned(),
        }
    }
}

#[derive(DeriveIden)]
pub enum WatchJobs {
    Table,
    Id,
    TravelDate,
    FromCode,
    ToCode,
    Recipients,
    IntervalMs,
    MaxInstances,
    Coalesce,
    NextRunAt,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Stations {
    Table,
    Code,
    Name,
}

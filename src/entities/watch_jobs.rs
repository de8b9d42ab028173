use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "watch_jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub travel_date: String,
    pub from_code: String,
    pub to_code: String,
    /// JSON array of addresses
    #[sea_orm(column_type = "Text")]
    pub recipients: String,
    /// Trigger interval in milliseconds
    pub interval_ms: i64,
    pub max_instances: i32,
    pub coalesce: bool,
    /// Unix epoch milliseconds, kept numeric so due-job scans compare correctly
    pub next_run_at: i64,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

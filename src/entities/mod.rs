//! SeaORM entities for the tables created by `database::migrations`

pub mod prelude;

pub mod stations;
pub mod watch_jobs;

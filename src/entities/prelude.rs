pub use super::stations::Entity as Stations;
pub use super::watch_jobs::Entity as WatchJobs;

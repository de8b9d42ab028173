pub mod station;
pub mod watch_job;

pub use station::StationSeaOrmRepository;
pub use watch_job::WatchJobSeaOrmRepository;

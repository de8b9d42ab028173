pub mod job;
pub mod station;
pub mod ticket;

pub use job::{JobPolicy, WatchAccepted, WatchJob, WatchRequest};
pub use station::Station;
pub use ticket::{SeatAvailability, SeatClass, SeatFields, Ticket};

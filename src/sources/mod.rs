pub mod left_ticket;
pub mod traits;

pub use left_ticket::LeftTicketClient;
pub use traits::AvailabilityQueryClient;

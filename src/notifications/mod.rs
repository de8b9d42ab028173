//! Digest notifications
//!
//! - `DigestRenderer`: turns a firing's tickets into a subject and HTML body
//! - `Notifier`: a delivery channel (`EmailNotifier` or `LogNotifier`)
//! - `NotificationDispatcher`: glue between the two

pub mod dispatcher;
pub mod email;
pub mod log;
pub mod templating;
pub mod traits;

pub use dispatcher::NotificationDispatcher;
pub use email::EmailNotifier;
pub use log::LogNotifier;
pub use templating::{Digest, DigestRenderer};
pub use traits::Notifier;

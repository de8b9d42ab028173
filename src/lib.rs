//! ticket-watch: polls the 12306 left-ticket endpoint for standing watch
//! requests and mails a digest whenever seats show up.

pub mod config;
pub mod context;
pub mod database;
pub mod entities;
pub mod errors;
pub mod job_scheduling;
pub mod models;
pub mod notifications;
pub mod sources;
pub mod stations;
pub mod utils;
pub mod web;

pub mod auth;
pub mod calendar;
pub mod config;
pub mod history;
pub mod notify;
pub mod offline;
pub mod profile;

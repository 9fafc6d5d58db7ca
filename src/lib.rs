pub mod classify;
pub mod config;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod monitor;
pub mod ui;
pub mod window;

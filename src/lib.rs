pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod login;
pub mod state;
pub mod types;

pub mod auth;
pub mod handle;
pub mod theme;
pub mod user;

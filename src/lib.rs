#![doc = "The `todoshare` library crate."]
#![doc = ""]
#![doc = "Multi-user todo lists: accounts with rotating refresh tokens, lists shared by"]
#![doc = "email, and tasks whose visibility follows their list. The binary (`main.rs`)"]
#![doc = "only reads configuration, picks a store and starts the server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use crate::config::Config;
pub use crate::error::AppError;
pub use crate::state::AppState;

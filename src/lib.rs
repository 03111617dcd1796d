pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod license;
pub mod models;
pub mod state;
pub mod store;
pub mod trial;
pub mod util;

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod populate;
pub mod profiles;
pub mod reports;
pub mod routines;
pub mod ui;

pub use error::{AppError, Result};

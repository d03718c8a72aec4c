pub mod config;
pub mod progression;

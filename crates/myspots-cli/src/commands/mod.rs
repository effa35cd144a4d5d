//! Command handlers

pub mod config;
pub mod export;
pub mod place;

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod error;
pub mod intake;
pub mod repository;
pub mod scoring;
pub mod telemetry;

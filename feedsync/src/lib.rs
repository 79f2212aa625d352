pub mod bootstrap;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod repository;
pub mod store;
pub mod telemetry;

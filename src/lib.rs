pub mod auth;
pub mod configuration;
pub mod domain;
pub mod email;
pub mod error;
pub mod middleware;
pub mod reset;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod validators;

//! Domain services and HTTP routers for the Zuhaush real-estate marketplace.

pub mod accounts;
pub mod app;
pub mod auth;
pub mod catalog;
pub mod chat;
pub mod cities;
pub mod config;
pub mod engagement;
pub mod error;
pub mod http;
pub mod mail;
pub mod notifications;
pub mod pagination;
pub mod store;
pub mod telemetry;
#[cfg(test)]
pub(crate) mod testing;
pub mod validation;
pub mod visits;

pub use app::{Marketplace, Repositories};

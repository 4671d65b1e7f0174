//! Abfahrt client services
//!
//! Transit data providers, client-local persistence (favorites, search
//! history, settings), and the application controller driving the
//! departures dashboard. Consumed by the `abfahrt` CLI.

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod network;
pub mod providers;

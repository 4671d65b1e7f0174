//! Networking utilities

mod client;

pub use client::HttpClient;

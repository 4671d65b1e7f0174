//! Transit data providers

pub mod bvg;
pub mod traits;
pub mod types;

pub use bvg::BvgProvider;
pub use traits::TransitProvider;

pub mod analyzer;
pub mod client;
pub mod rate_limit;
pub mod types;

pub use analyzer::*;
pub use client::*;
pub use rate_limit::*;
pub use types::*;

mod config;
mod constants;
mod error;
mod executor;
mod stats;

pub use config::*;
pub use constants::*;
pub use error::*;
pub use executor::*;
pub use stats::*;

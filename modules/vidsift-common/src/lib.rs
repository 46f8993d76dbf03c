pub mod config;
pub mod normalize;
pub mod risk;
pub mod types;

pub use config::Config;
pub use risk::*;
pub use types::*;

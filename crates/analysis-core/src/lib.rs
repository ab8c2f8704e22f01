pub mod coerce;
pub mod config;
pub mod error;
pub mod quality;
pub mod traits;
pub mod types;

pub use coerce::*;
pub use config::*;
pub use error::*;
pub use quality::*;
pub use traits::*;
pub use types::*;

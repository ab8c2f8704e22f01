pub mod detector;
pub mod indicators;
pub mod patterns;
pub mod strategy;

#[cfg(test)]
mod indicators_tests;

pub use detector::*;
pub use indicators::*;
pub use patterns::*;
pub use strategy::*;

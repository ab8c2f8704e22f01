pub mod backtesting;

pub use backtesting::{ExpectedMove, PatternBacktester};

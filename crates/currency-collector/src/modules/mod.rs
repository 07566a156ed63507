//! 데이터 수집 모듈.

pub mod payload;
pub mod rate_collect;

pub use payload::{parse_latest_rates, LatestRates, PayloadError};
pub use rate_collect::{run_cycle, CycleOutcome, CycleReport};

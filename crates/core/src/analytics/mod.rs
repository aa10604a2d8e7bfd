pub mod bottleneck;
pub mod digest;
pub mod ranking;
pub mod trend;

pub use bottleneck::{bottlenecks, drop_stats, DropStat};
pub use digest::{build_report, DigestInputs, DigestReport, PeriodRows};
pub use ranking::{rank, RankedUser, UserPeriodStats};
pub use trend::{compare, period_stats, trend, PeriodComparison, PeriodStats, TrendDirection};

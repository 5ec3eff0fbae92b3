pub mod error;
pub mod misc;
pub mod processor;
pub mod stats;
pub mod window;

pub use error::MetricsError;
pub use misc::{ColumnStats, DateMean, DerivedRow, Describe, Summary};
pub use processor::filter_and_compute;
pub use stats::{describe, mean_close_by_date, summarize, to_frame};
pub use window::Window;

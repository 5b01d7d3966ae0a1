pub mod args;
pub mod backoff;
pub mod clock;
pub mod distance;
pub mod errors;
pub mod formatter;
pub mod logging;
pub mod start;
pub mod timestamp;

pub use args::Args;
pub use errors::AgoError;
pub use formatter::{AgoStream, SessionState, StopHandle, TimeAgo, format, format_with_clock};
pub use start::run_app;
pub use timestamp::TimeInput;

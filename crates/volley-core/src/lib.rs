//! Paced bulk HTTP dispatch.
//!
//! Issues one request per endpoint, staggers launches by a throttle interval,
//! waits for every request to settle and returns per-endpoint outcomes in
//! input order.

pub mod config;
pub mod logging;

pub mod dispatcher;
pub mod error;
pub mod outcome;
pub mod pacer;
pub mod progress;
pub mod transform;
pub mod transport;

pub use config::{DispatchConfig, DispatchOptions, ProgressSetting};
pub use dispatcher::{CounterSnapshot, DispatchReport, Dispatcher};
pub use error::{ConfigError, DispatchError};
pub use outcome::{JobError, Outcome};
pub use transport::{CurlTransport, RequestError, Response, Transport};

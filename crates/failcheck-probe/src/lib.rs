//! failcheck-probe — content probes for failover verification.
//!
//! A content probe fetches a URL and reports whether the body contains an
//! expected substring. It is how failcheck tells which version of a
//! service is being served: the maintenance page during failover, the
//! real application once instances are back.
//!
//! # Architecture
//!
//! ```text
//! poll_for_content()
//!   ├── ticker task: every interval → Probe::probe() → signal on match
//!   └── deadline:    sleep(timeout)
//!   first to finish wins, the ticker is aborted either way
//! ```

pub mod content;
pub mod error;
pub mod probe;

pub use content::{ContentPollOutcome, poll_for_content};
pub use error::{ProbeError, ProbeResult};
pub use probe::{HttpProbe, Probe, validate_url};

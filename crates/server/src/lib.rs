#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Deliberately slow chart repository server
//!
//! Serves a frozen `index.yaml` behind an admission limiter and an optional
//! simulated delay, so installers and resolvers can be exercised against a
//! contended backend. Every wait on the request path races the request's
//! cancellation token.

mod counter;
mod handler;
mod latency;
mod lifecycle;
mod limiter;
mod router;

pub use counter::RequestCounter;
pub use handler::{IndexHandler, INDEX_CONTENT_TYPE};
pub use latency::{delay, race_cancellation, LatencyInjector};
pub use lifecycle::{prepare_index, RegistryServer};
pub use limiter::{AdmissionLimiter, AdmissionPermit};
pub use router::router;

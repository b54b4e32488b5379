pub mod backend;
pub mod clock;
pub mod engine;
pub mod error;
pub mod orders;
pub mod params;
pub mod riders;
pub mod sampling;
pub mod schedule;
pub mod snapshot;
pub mod spatial;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

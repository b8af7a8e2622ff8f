//! Process-wide tracing setup shared by the binaries and test harnesses.

pub mod tracing;

pub use crate::tracing::{LogFormat, init, init_for_tests, init_with};

//! isuprof - per-call profiling instrumentation for Go packages.
//!
//! Every call of a function value in the package is routed through a
//! generated wrapper that logs the callee's name and elapsed time. Wrappers
//! are shared by all call sites whose callee has the same signature.

pub mod config;
pub mod error;
pub mod frontend;
pub mod instrument;

pub use config::Config;
pub use error::{GenerationError, IsuprofError, Result};
pub use instrument::{Instrumenter, Report};

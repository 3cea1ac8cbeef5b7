//! Library side of the `imagen` binary: logging setup, the batch pipeline
//! and its result types.

pub mod logging;
pub mod pipeline;
pub mod types;

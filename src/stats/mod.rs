//! Stats collection
//!
//! Walks records and accumulates one shape descriptor per field path. The
//! collected stats decide which columns the exporter creates.

mod collector;
mod replay;

pub use collector::StatsCollector;

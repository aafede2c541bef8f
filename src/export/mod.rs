pub mod json;
pub mod text;

pub use json::*;
pub use text::*;

use anyhow::Result;

use crate::state::{HopResult, TraceSummary, TraceTarget};

/// Consumer of per-hop results, in hop order
pub trait HopSink {
    /// Called once before the first probe
    fn begin(&mut self, target: &TraceTarget) -> Result<()>;

    /// Called once per hop, in strictly increasing hop order
    fn hop(&mut self, hop: &HopResult) -> Result<()>;

    /// Called once after the last hop
    fn finish(&mut self, summary: &TraceSummary) -> Result<()>;
}

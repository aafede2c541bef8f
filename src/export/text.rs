use anyhow::Result;
use std::io::Write;

use crate::export::HopSink;
use crate::state::{HopOutcome, HopResult, TraceSummary, TraceTarget};

/// Line printed after the hop that reached the destination
pub const DESTINATION_REACHED: &str = "Destination reached.";

/// Format one hop as `<ttl>\t<addr-or-*>\t<rtt-or-message>`
pub fn format_hop(hop: &HopResult) -> String {
    let addr = hop
        .responder
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "*".to_string());
    let rtt = hop
        .rtt
        .map(|rtt| format!("{:.2}ms", rtt.as_secs_f64() * 1000.0));

    let detail = match (&hop.outcome, rtt) {
        (HopOutcome::TimedOut, _) => "Request timed out".to_string(),
        (HopOutcome::Failed { reason }, _) => reason.clone(),
        (HopOutcome::Unexpected { icmp_type }, Some(rtt)) => {
            format!("{} (ICMP type {})", rtt, icmp_type)
        }
        (HopOutcome::Malformed, Some(rtt)) => format!("{} (malformed response)", rtt),
        (_, Some(rtt)) => rtt,
        (_, None) => "-".to_string(),
    };

    format!("{}\t{}\t{}", hop.hop, addr, detail)
}

/// Streams one line per hop as results arrive
pub struct TextSink<W: Write> {
    writer: W,
    announced: bool,
}

impl<W: Write> TextSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            announced: false,
        }
    }

    /// Print the `Traceroute to <host> (<addr>)` banner, once
    pub fn announce(&mut self, target: &TraceTarget) -> Result<()> {
        if !self.announced {
            writeln!(self.writer, "Traceroute to {} ({})", target.host, target.address)?;
            self.writer.flush()?;
            self.announced = true;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> HopSink for TextSink<W> {
    fn begin(&mut self, target: &TraceTarget) -> Result<()> {
        self.announce(target)
    }

    fn hop(&mut self, hop: &HopResult) -> Result<()> {
        writeln!(self.writer, "{}", format_hop(hop))?;
        if hop.is_terminal() {
            writeln!(self.writer, "{}", DESTINATION_REACHED)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self, _summary: &TraceSummary) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

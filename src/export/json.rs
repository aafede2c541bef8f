use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

use crate::export::HopSink;
use crate::state::{HopResult, TraceSummary, TraceTarget};

/// Document written by [`JsonSink`] once the trace is over
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    target: &'a str,
    address: String,
    reached: bool,
    destination_hop: Option<u8>,
    hops: &'a [HopResult],
}

/// Buffers hops and writes a single pretty-printed JSON document at the end
pub struct JsonSink<W: Write> {
    writer: W,
    target: Option<TraceTarget>,
    hops: Vec<HopResult>,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            target: None,
            hops: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> HopSink for JsonSink<W> {
    fn begin(&mut self, target: &TraceTarget) -> Result<()> {
        self.target = Some(target.clone());
        self.hops.clear();
        Ok(())
    }

    fn hop(&mut self, hop: &HopResult) -> Result<()> {
        self.hops.push(hop.clone());
        Ok(())
    }

    fn finish(&mut self, summary: &TraceSummary) -> Result<()> {
        let target = self
            .target
            .as_ref()
            .context("JSON sink finished before it was started")?;

        let report = JsonReport {
            target: &target.host,
            address: target.address.to_string(),
            reached: summary.reached,
            destination_hop: summary.destination_hop,
            hops: &self.hops,
        };

        serde_json::to_writer_pretty(&mut self.writer, &report)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::HopOutcome;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    #[test]
    fn test_json_report() {
        let target = TraceTarget::new("one.one.one.one", Ipv4Addr::new(1, 1, 1, 1));
        let mut sink = JsonSink::new(Vec::new());

        sink.begin(&target).unwrap();
        sink.hop(&HopResult::answered(
            1,
            Ipv4Addr::new(192, 168, 1, 1),
            Duration::from_millis(2),
            HopOutcome::Intermediate,
        ))
        .unwrap();
        sink.hop(&HopResult::timed_out(2)).unwrap();
        sink.finish(&TraceSummary {
            hops: 2,
            reached: false,
            destination_hop: None,
        })
        .unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["target"], "one.one.one.one");
        assert_eq!(value["address"], "1.1.1.1");
        assert_eq!(value["reached"], false);
        assert!(value["destination_hop"].is_null());

        let hops = value["hops"].as_array().unwrap();
        assert_eq!(hops.len(), 2);
        assert_eq!(hops[0]["kind"], "intermediate");
        assert_eq!(hops[0]["rtt_ms"], 2.0);
        assert_eq!(hops[1]["kind"], "timed_out");

        let parsed: Vec<HopResult> = serde_json::from_value(value["hops"].clone()).unwrap();
        assert_eq!(parsed[1], HopResult::timed_out(2));
    }

    #[test]
    fn test_finish_without_begin_fails() {
        let mut sink = JsonSink::new(Vec::new());
        let summary = TraceSummary {
            hops: 0,
            reached: false,
            destination_hop: None,
        };
        assert!(sink.finish(&summary).is_err());
    }
}

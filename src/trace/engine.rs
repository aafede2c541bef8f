use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

use crate::config::TraceConfig;
use crate::error::TransportError;
use crate::export::HopSink;
use crate::probe::{Classification, ResponseKind, Transport, build_echo_request, classify};
use crate::state::{HopOutcome, HopResult, TraceSummary, TraceTarget};

/// Where the hop loop stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceState {
    /// About to probe this TTL
    Probing(u8),
    /// Echo Reply received at this TTL
    Reached(u8),
    /// Hop ceiling passed without an Echo Reply
    Exhausted,
}

impl TraceState {
    fn initial(max_ttl: u8) -> Self {
        if max_ttl == 0 {
            TraceState::Exhausted
        } else {
            TraceState::Probing(1)
        }
    }

    /// Transition after the result for `ttl` has been emitted
    fn after(ttl: u8, result: &HopResult, max_ttl: u8) -> Self {
        if result.is_terminal() {
            TraceState::Reached(ttl)
        } else if ttl >= max_ttl {
            TraceState::Exhausted
        } else {
            TraceState::Probing(ttl + 1)
        }
    }
}

fn outcome_for(kind: ResponseKind) -> HopOutcome {
    match kind {
        ResponseKind::EchoReply => HopOutcome::DestinationReached,
        ResponseKind::TimeExceeded => HopOutcome::Intermediate,
        ResponseKind::Unexpected(icmp_type) => HopOutcome::Unexpected { icmp_type },
        ResponseKind::Malformed => HopOutcome::Malformed,
    }
}

/// Drives one probe per TTL through a [`Transport`], one hop at a time
///
/// Each hop is sent, awaited, and classified before the next TTL is tried.
/// Per-hop failures become hop results; only sink errors abort the loop.
pub struct HopLoop<'a, T: Transport> {
    transport: &'a mut T,
    config: &'a TraceConfig,
}

impl<'a, T: Transport> HopLoop<'a, T> {
    pub fn new(transport: &'a mut T, config: &'a TraceConfig) -> Self {
        Self { transport, config }
    }

    /// Probe TTL 1..=max_ttl, stopping at the first Echo Reply
    pub fn run<S: HopSink + ?Sized>(
        &mut self,
        target: &TraceTarget,
        sink: &mut S,
    ) -> Result<TraceSummary> {
        debug!(
            destination = %target.address,
            max_ttl = self.config.max_ttl,
            timeout = ?self.config.timeout,
            match_probe = self.config.match_probe,
            "starting trace"
        );
        sink.begin(target)?;

        let mut emitted = 0usize;
        let mut state = TraceState::initial(self.config.max_ttl);

        while let TraceState::Probing(ttl) = state {
            let result = self.probe_hop(ttl);
            sink.hop(&result)?;
            emitted += 1;
            state = TraceState::after(ttl, &result, self.config.max_ttl);
        }

        let destination_hop = match state {
            TraceState::Reached(ttl) => Some(ttl),
            _ => None,
        };
        let summary = TraceSummary {
            hops: emitted,
            reached: destination_hop.is_some(),
            destination_hop,
        };
        debug!(?summary, "trace finished");

        sink.finish(&summary)?;
        Ok(summary)
    }

    /// Send one probe at `ttl` and turn whatever happens into a hop result
    pub fn probe_hop(&mut self, ttl: u8) -> HopResult {
        // Some platforms reject rapid option churn; the send still goes out
        if let Err(e) = self.transport.set_hop_limit(ttl) {
            warn!(ttl, error = %e, "could not set hop limit, probing with previous TTL");
        }

        let packet = build_echo_request(self.config.identifier, ttl as u16, self.config.payload_size);

        let sent_at = match self.transport.send_probe(&packet) {
            Ok(sent_at) => sent_at,
            Err(e) => {
                warn!(ttl, error = %e, "probe not sent");
                return HopResult::failed(ttl, e.to_string());
            }
        };
        trace!(ttl, identifier = self.config.identifier, "sent echo request");

        self.await_response(ttl, sent_at)
    }

    fn correlates(&self, classification: &Classification, ttl: u8) -> bool {
        classification
            .embedded
            .is_some_and(|probe| probe.matches(self.config.identifier, ttl as u16))
    }

    fn await_response(&mut self, ttl: u8, sent_at: Instant) -> HopResult {
        let deadline = sent_at + self.config.timeout;

        loop {
            // Without correlation the first datagram decides, so keep the full timeout
            let wait = if self.config.match_probe {
                deadline.saturating_duration_since(Instant::now())
            } else {
                self.config.timeout
            };

            let response = match self.transport.receive_response(wait) {
                Ok(response) => response,
                Err(TransportError::Timeout) => {
                    debug!(ttl, "no response before timeout");
                    return HopResult::timed_out(ttl);
                }
                Err(e) if e.is_fatal() => {
                    error!(ttl, error = %e, "receive endpoint unusable");
                    return HopResult::failed(ttl, e.to_string());
                }
                Err(e) => {
                    warn!(ttl, error = %e, "receive failed");
                    return HopResult::failed(ttl, e.to_string());
                }
            };

            let classification = classify(&response.bytes);

            if self.config.match_probe && !self.correlates(&classification, ttl) {
                trace!(
                    ttl,
                    source = %response.source,
                    kind = ?classification.kind,
                    embedded = ?classification.embedded,
                    "dropped response for another probe"
                );
                if Instant::now() >= deadline {
                    return HopResult::timed_out(ttl);
                }
                continue;
            }

            let rtt = response
                .received_at
                .saturating_duration_since(sent_at);
            debug!(
                ttl,
                source = %response.source,
                kind = ?classification.kind,
                rtt_ms = rtt.as_secs_f64() * 1000.0,
                "received response"
            );

            return HopResult::answered(
                ttl,
                response.source,
                rtt,
                outcome_for(classification.kind),
            );
        }
    }
}

/// Total worst-case runtime: every hop waits out its timeout
pub fn worst_case_duration(config: &TraceConfig) -> Duration {
    config.timeout * config.max_ttl as u32
}

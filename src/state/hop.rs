use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

/// How a single hop ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HopOutcome {
    /// Nothing arrived before the timeout
    TimedOut,
    /// Time Exceeded from a router on the path
    Intermediate,
    /// Echo Reply from the destination
    DestinationReached,
    /// Some other ICMP type arrived
    Unexpected { icmp_type: u8 },
    /// A datagram arrived but its headers did not fit inside it
    Malformed,
    /// The probe could not be sent or the receive failed outright
    Failed { reason: String },
}

impl HopOutcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, HopOutcome::DestinationReached)
    }
}

/// Result of probing one TTL. Built once, handed to the sink, then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopResult {
    pub hop: u8,
    /// Address that answered, if anything did
    pub responder: Option<Ipv4Addr>,
    /// Round-trip time, present only alongside a responder
    #[serde(rename = "rtt_ms", with = "rtt_ms")]
    pub rtt: Option<Duration>,
    #[serde(flatten)]
    pub outcome: HopOutcome,
}

impl HopResult {
    pub fn timed_out(hop: u8) -> Self {
        Self {
            hop,
            responder: None,
            rtt: None,
            outcome: HopOutcome::TimedOut,
        }
    }

    pub fn failed(hop: u8, reason: impl Into<String>) -> Self {
        Self {
            hop,
            responder: None,
            rtt: None,
            outcome: HopOutcome::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn answered(hop: u8, responder: Ipv4Addr, rtt: Duration, outcome: HopOutcome) -> Self {
        Self {
            hop,
            responder: Some(responder),
            rtt: Some(rtt),
            outcome,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_terminal()
    }
}

/// Serde helper: Option<Duration> as fractional milliseconds
mod rtt_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(rtt: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rtt.map(|d| d.as_micros() as f64 / 1000.0)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = Option::<f64>::deserialize(deserializer)?;
        Ok(ms.map(|ms| Duration::from_micros((ms * 1000.0).round() as u64)))
    }
}

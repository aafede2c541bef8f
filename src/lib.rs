//! ICMP traceroute: one Echo Request per TTL, reporting which router answers
//! at each hop until the destination replies or the hop ceiling is reached.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod probe;
pub mod resolve;
pub mod runner;
pub mod state;
pub mod trace;

//! Process-level driver: argument parsing, resolution, endpoint lifetime,
//! and the mapping of every failure onto an exit code.
//!
//! Resolution and endpoint acquisition are injected so the whole flow can be
//! exercised without network access or raw-socket privilege.

use clap::Parser;
use clap::error::ErrorKind;
use std::ffi::OsString;
use std::io::Write;
use std::net::Ipv4Addr;
use tracing::debug;

use crate::cli::Args;
use crate::config::TraceConfig;
use crate::error::TransportError;
use crate::export::{HopSink, JsonSink, TextSink};
use crate::probe::Transport;
use crate::state::TraceTarget;
use crate::trace::{HopLoop, worst_case_duration};

/// Trace completed, whether or not the destination answered
pub const EXIT_SUCCESS: u8 = 0;
/// Usage error, unresolvable host, or endpoints could not be acquired
pub const EXIT_FAILURE: u8 = 1;

/// Parse the command line
///
/// `--help` and `--version` print to `stdout` and yield exit code 0; any other
/// parse error prints usage to `stderr` and yields exit code 1.
pub fn parse_args<I, T, W, E>(argv: I, stdout: &mut W, stderr: &mut E) -> Result<Args, u8>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    W: Write,
    E: Write,
{
    match Args::try_parse_from(argv) {
        Ok(args) => Ok(args),
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = write!(stdout, "{}", e);
                Err(EXIT_SUCCESS)
            }
            _ => {
                let _ = write!(stderr, "{}", e);
                Err(EXIT_FAILURE)
            }
        },
    }
}

/// Message for a failed endpoint acquisition, with a fix for privilege errors
pub fn open_failure_message(err: &TransportError) -> String {
    match err {
        TransportError::PermissionDenied { .. } => format!(
            "Error: {}\n\n\
             Raw ICMP sockets need elevated privileges.\n\
             Fix: run with sudo, or grant the capability once:\n  \
             sudo setcap cap_net_raw+ep $(which tracehop)",
            err
        ),
        _ => format!("Error: {}", err),
    }
}

/// Run one trace for already-parsed arguments and return the exit code
///
/// The transport returned by `open` is closed exactly once before this
/// returns, on every path after it was acquired.
pub fn trace<R, O, T, W, E>(args: &Args, resolve: R, open: O, stdout: W, stderr: &mut E) -> u8
where
    R: FnOnce(&str) -> Option<Ipv4Addr>,
    O: FnOnce(Ipv4Addr, &TraceConfig) -> Result<T, TransportError>,
    T: Transport,
    W: Write,
    E: Write,
{
    if let Err(e) = args.validate() {
        let _ = writeln!(stderr, "Error: {}", e);
        return EXIT_FAILURE;
    }

    let Some(address) = resolve(&args.destination) else {
        let _ = writeln!(stderr, "Could not resolve hostname: {}", args.destination);
        return EXIT_FAILURE;
    };

    let config = TraceConfig::from(args);
    let target = TraceTarget::new(args.destination.as_str(), address);
    debug!(
        host = %target.host,
        %address,
        worst_case = ?worst_case_duration(&config),
        "resolved destination"
    );

    if args.json {
        drive(JsonSink::new(stdout), &config, &target, open, stderr)
    } else {
        // Banner goes out before the sockets are acquired
        let mut sink = TextSink::new(stdout);
        if let Err(e) = sink.announce(&target) {
            let _ = writeln!(stderr, "Error: {:#}", e);
            return EXIT_FAILURE;
        }
        drive(sink, &config, &target, open, stderr)
    }
}

fn drive<S, O, T, E>(
    mut sink: S,
    config: &TraceConfig,
    target: &TraceTarget,
    open: O,
    stderr: &mut E,
) -> u8
where
    S: HopSink,
    O: FnOnce(Ipv4Addr, &TraceConfig) -> Result<T, TransportError>,
    T: Transport,
    E: Write,
{
    let mut transport = match open(target.address, config) {
        Ok(transport) => transport,
        Err(e) => {
            let _ = writeln!(stderr, "{}", open_failure_message(&e));
            return EXIT_FAILURE;
        }
    };

    let outcome = HopLoop::new(&mut transport, config).run(target, &mut sink);
    transport.close();

    match outcome {
        Ok(summary) => {
            debug!(?summary, "trace complete");
            EXIT_SUCCESS
        }
        Err(e) => {
            let _ = writeln!(stderr, "Error: {:#}", e);
            EXIT_FAILURE
        }
    }
}

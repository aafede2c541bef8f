use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use tracehop::probe::RawTransport;
use tracehop::resolve::resolve;
use tracehop::runner;

/// Logs go to stderr; stdout carries only trace output
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = match runner::parse_args(std::env::args_os(), &mut io::stdout(), &mut io::stderr()) {
        Ok(args) => args,
        Err(code) => return ExitCode::from(code),
    };

    init_logging(args.verbose);

    let code = runner::trace(
        &args,
        resolve,
        |address, config| RawTransport::open(address, config.timeout),
        io::stdout().lock(),
        &mut io::stderr(),
    );
    ExitCode::from(code)
}

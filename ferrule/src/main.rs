//! Ferrule client runner.
//!
//! Starts one or more client loops against a CoAP server, each on its own
//! thread, and runs them until interrupted. The loops take turns holding a
//! shared execution claim and only give it up while they wait on their
//! sockets.

use clap::{Parser, ValueEnum};
use ferrule::{
    ClaimHooks, Datagram, Exclusive, LoopBuilder, LoopError, RunStats, Runner, ServerUri,
    StopSignal, TimerQueue, UdpTransport,
};
use signal_hook::consts::{SIGINT, SIGTERM};
use std::cell::Cell;
use std::io;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "ferrule")]
#[command(about = "Runs device-management client loops against a CoAP server", long_about = None)]
struct Args {
    /// Server URI
    #[arg(short = 'u', long, default_value = "coap://localhost:5683")]
    server_uri: ServerUri,

    /// Number of clients
    #[arg(short = 'n', default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    clients: u32,

    /// Set the logging level
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = LogLevel::Warning)]
    log_level: LogLevel,

    /// Upper bound of a single wait, in milliseconds
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    max_wait_ms: u64,

    /// Interval between client status lines, in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    status_interval_secs: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Filter directive for this level.
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ClientError {
    #[error("socket setup failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Loop(#[from] LoopError),
}

/// Settings shared by every client thread.
#[derive(Debug, Clone, Copy)]
struct ClientConfig {
    server: SocketAddr,
    max_wait: Duration,
    status_interval: Duration,
}

fn endpoint_name(index: u32) -> String {
    format!("urn:imei:{index:015}")
}

fn init_tracing(level: LogLevel) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| level.directive().into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_thread_names(true)
                .with_line_number(true),
        )
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_level);

    let server = match args.server_uri.resolve() {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, uri = %args.server_uri, "cannot resolve server");
            return ExitCode::FAILURE;
        }
    };

    let stop = StopSignal::new();
    for signal in [SIGINT, SIGTERM] {
        if let Err(e) = signal_hook::flag::register(signal, stop.flag()) {
            error!(error = %e, signal, "cannot install signal handler");
            return ExitCode::FAILURE;
        }
    }

    let config = ClientConfig {
        server,
        max_wait: Duration::from_millis(args.max_wait_ms),
        status_interval: Duration::from_secs(args.status_interval_secs),
    };

    let claim = Arc::new(Exclusive::new());
    let mut clients = Vec::new();

    for index in 0..args.clients {
        let name = endpoint_name(index);
        let claim = claim.clone();
        let client_stop = stop.clone();

        let spawned = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_client(&name, config, &claim, &client_stop));

        match spawned {
            Ok(handle) => clients.push(handle),
            Err(e) => {
                error!(error = %e, "cannot spawn client thread");
                stop.trigger();
                break;
            }
        }
    }

    info!(clients = clients.len(), server = %server, "clients running, press Ctrl-C to stop");

    let mut failed = false;
    for handle in clients {
        match handle.join() {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                error!(error = %e, "client failed");
                failed = true;
            }
            Err(_) => {
                error!("client thread panicked");
                failed = true;
            }
        }
    }

    info!("Bye");

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Runs one client while holding the shared claim.
fn run_client(
    name: &str,
    config: ClientConfig,
    claim: &Arc<Exclusive>,
    stop: &StopSignal,
) -> Result<RunStats, ClientError> {
    let _held = claim.acquire();
    drive_client(name, config, claim, stop)
}

fn drive_client(
    name: &str,
    config: ClientConfig,
    claim: &Arc<Exclusive>,
    stop: &StopSignal,
) -> Result<RunStats, ClientError> {
    let received = Rc::new(Cell::new(0u64));

    let counter = received.clone();
    let mut transport = UdpTransport::new(move |datagram: Datagram<'_>| {
        counter.set(counter.get() + 1);
        debug!(peer = %datagram.peer, bytes = datagram.payload.len(), "datagram received");
        Ok(())
    });
    transport.connect(config.server)?;

    let mut timers = TimerQueue::new();
    let status_name = name.to_owned();
    let status_received = received.clone();
    timers.schedule_every(config.status_interval, move || {
        info!(endpoint = %status_name, datagrams = status_received.get(), "client alive");
    });

    let mut driver = LoopBuilder::new().max_wait(config.max_wait).build(
        transport,
        timers,
        ClaimHooks::new(claim.clone()),
    );

    info!(endpoint = name, server = %config.server, "client started");

    let stats = Runner::new().run(&mut driver, stop)?;

    info!(
        endpoint = name,
        iterations = stats.iterations,
        datagrams = received.get(),
        failures = stats.failures,
        "client stopped"
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_names() {
        assert_eq!(endpoint_name(0), "urn:imei:000000000000000");
        assert_eq!(endpoint_name(42), "urn:imei:000000000000042");
    }

    #[test]
    fn test_default_args() {
        let args = Args::try_parse_from(["ferrule"]).unwrap();

        assert_eq!(args.server_uri.host(), "localhost");
        assert_eq!(args.server_uri.port(), 5683);
        assert_eq!(args.clients, 1);
        assert_eq!(args.log_level, LogLevel::Warning);
        assert_eq!(args.max_wait_ms, 100);
    }

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "ferrule",
            "-u",
            "coap://127.0.0.1:5700",
            "-n",
            "3",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(args.server_uri.port(), 5700);
        assert_eq!(args.clients, 3);
        assert_eq!(args.log_level, LogLevel::Debug);
        assert_eq!(args.log_level.directive(), "debug");
    }

    #[test]
    fn test_reject_bad_args() {
        assert!(Args::try_parse_from(["ferrule", "-n", "0"]).is_err());
        assert!(Args::try_parse_from(["ferrule", "-u", "coaps://localhost"]).is_err());
        assert!(Args::try_parse_from(["ferrule", "--max-wait-ms", "0"]).is_err());
    }

    #[test]
    fn test_critical_maps_to_error() {
        assert_eq!(LogLevel::Critical.directive(), "error");
        assert_eq!(LogLevel::Warning.directive(), "warn");
    }
}

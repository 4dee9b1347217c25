// ============================================================================
// Venue Binary
// TCP or stdin front end: one session per client, events on stdout
// ============================================================================

use std::io::{self, BufReader};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use venue_engine::prelude::*;

const DEFAULT_LISTEN: &str = "127.0.0.1:7878";

fn print_help() {
    eprintln!(
        r#"Venue - multi-instrument limit order matching engine

USAGE:
    venue [OPTIONS]

OPTIONS:
    --listen <ADDR>           Accept TCP clients on ADDR (default: {DEFAULT_LISTEN})
    --stdin                   Serve a single session on standard input
    --max-connections <N>     Refuse clients beyond N open sessions
    --json                    Write events as JSON lines (needs the serde feature)
    --help                    Print this help message

ENVIRONMENT VARIABLES:
    VENUE_LISTEN              Listen address, overridden by --listen
    VENUE_MAX_CONNECTIONS     Session cap, overridden by --max-connections
    RUST_LOG                  Log level filter

INPUT (one command per line):
    B <id> <instrument> <price> <count>
    S <id> <instrument> <price> <count>
    C <id>

EXAMPLES:
    # Serve TCP clients on the default address
    venue

    # Replay a command file
    venue --stdin < orders.txt
"#
    );
}

fn exit_with(message: String) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn parse_limit(value: &str, source: &str) -> usize {
    value
        .parse()
        .unwrap_or_else(|_| exit_with(format!("{} expects a positive integer, got {:?}", source, value)))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Events own stdout, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "venue_engine=info,venue=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut listen = std::env::var("VENUE_LISTEN").unwrap_or_else(|_| DEFAULT_LISTEN.to_string());
    let mut max_connections = std::env::var("VENUE_MAX_CONNECTIONS")
        .ok()
        .map(|value| parse_limit(&value, "VENUE_MAX_CONNECTIONS"));
    let mut use_stdin = false;
    #[cfg_attr(not(feature = "serde"), allow(unused_mut))]
    let mut format = EventFormat::Text;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            },
            "--listen" | "-l" => {
                i += 1;
                if i >= args.len() {
                    exit_with("--listen requires an address argument".to_string());
                }
                listen = args[i].clone();
            },
            "--max-connections" => {
                i += 1;
                if i >= args.len() {
                    exit_with("--max-connections requires a number".to_string());
                }
                max_connections = Some(parse_limit(&args[i], "--max-connections"));
            },
            "--stdin" => use_stdin = true,
            #[cfg(feature = "serde")]
            "--json" => format = EventFormat::Json,
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            },
        }
        i += 1;
    }

    let config = EngineConfig {
        max_connections,
        ..EngineConfig::default()
    };

    let engine = MatchingEngineBuilder::new()
        .with_config(config)
        .with_event_handler(Arc::new(WriterEventHandler::with_format(io::stdout(), format)))
        .build()?;

    if use_stdin {
        let session = engine.dispatcher();
        tracing::info!(session = %session.session(), "serving standard input");
        let processed = session.run(&mut LineConnection::new(io::stdin().lock()));
        tracing::info!(processed, "standard input closed");
        return Ok(());
    }

    let listener = TcpListener::bind(&listen)?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    if let Some(limit) = engine.config().max_connections {
        tracing::info!("Session cap: {}", limit);
    }

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                continue;
            },
        };

        let peer = stream.peer_addr().ok();
        match engine.accept(LineConnection::new(BufReader::new(stream))) {
            Ok(handle) => {
                tracing::info!(session = %handle.session(), ?peer, "client connected");
            },
            Err(e) => {
                tracing::warn!(?peer, error = %e, "client dropped");
            },
        }
    }

    Ok(())
}

//! amb-client: command-line client for the named-message bus
//!
//! Usage:
//!   amb-client                      - Listen for the configured message names
//!   amb-client --listen a,b         - Listen for `a` and `b`
//!   amb-client --send NAME JSON     - Send one message and exit
//!   amb-client --interactive        - Send `NAME JSON` lines read from stdin
//!   amb-client --help               - Show help

mod cli;

use amb_core::Config;
use amb_ws::connect_bus;
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq)]
enum RunMode {
    /// Print received messages until Ctrl+C
    Listen,
    /// Send one message, flush and exit
    Send { name: String, payload: String },
    /// Read messages to send from stdin
    Interactive,
    /// Show help
    Help,
    /// Show version
    Version,
}

/// Parsed command line
#[derive(Debug, PartialEq)]
struct Args {
    mode: RunMode,
    url: Option<String>,
    listen: Option<Vec<String>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("amb-client: {}", e);
            eprintln!();
            print_help();
            std::process::exit(2);
        }
    };

    match args.mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("amb-client {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Logs go to stderr so stdout carries only received messages
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let mut config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;
    if let Some(url) = args.url {
        config.connection.page_url = url;
    }
    if let Some(listen) = args.listen {
        config.client.listen = listen;
    }

    let page = config.connection.page()?;
    tracing::info!("Page: {}", page);

    let (bus, transport) = connect_bus(&page, config.connection.scheme_policy)?;
    cli::register_printers(&bus, &config.client.listen);
    bus.start();

    transport
        .wait_open(config.connection.connect_timeout())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect: {}", e))?;

    match args.mode {
        RunMode::Send { name, payload } => cli::send_once(&bus, &transport, &name, &payload).await,
        RunMode::Listen => cli::listen(&bus, &transport).await,
        RunMode::Interactive => cli::run_interactive(&bus, &transport).await,
        _ => Ok(()),
    }
}

/// Parse command line arguments (without the program name)
fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args {
        mode: RunMode::Listen,
        url: None,
        listen: None,
    };
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => parsed.mode = RunMode::Help,
            "--version" | "-v" => parsed.mode = RunMode::Version,
            "--interactive" | "-i" => parsed.mode = RunMode::Interactive,
            "--send" | "-s" => {
                let name = args.next().ok_or("--send needs a message name")?;
                let payload = args.next().unwrap_or_else(|| "null".to_string());
                parsed.mode = RunMode::Send { name, payload };
            }
            "--url" | "-u" => {
                parsed.url = Some(args.next().ok_or("--url needs a page URL")?);
            }
            "--listen" | "-l" => {
                let names = args.next().ok_or("--listen needs a comma-separated list")?;
                parsed.listen = Some(
                    names
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect(),
                );
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
    }

    Ok(parsed)
}

/// Print help message
fn print_help() {
    println!("amb-client - named-message WebSocket client");
    println!();
    println!("Usage:");
    println!("  amb-client                      Listen for the configured message names");
    println!("  amb-client --listen a,b         Listen for messages named a and b");
    println!("  amb-client --send NAME JSON     Send one message and exit");
    println!("  amb-client --interactive        Send `NAME JSON` lines read from stdin");
    println!("  amb-client --url URL            Page URL the socket host is taken from");
    println!("  amb-client --help               Show this help message");
    println!("  amb-client --version            Show version");
    println!();
    println!("Environment Variables:");
    println!("  AMBIORIX_PAGE_URL          Page URL (default: http://localhost:3000)");
    println!("  AMBIORIX_SCHEME_POLICY     match_page or always_insecure (default: match_page)");
    println!("  AMBIORIX_CONNECT_TIMEOUT   Seconds to wait for the socket (default: 10)");
    println!("  AMBIORIX_LISTEN            Comma-separated message names to print");
    println!("  RUST_LOG                   Log filter");
}

//! Client modes
//!
//! One-shot send, listen, and an interactive mode that reads
//! `NAME JSON` lines from stdin.

use std::time::Duration;

use amb_core::MessageBus;
use amb_ws::WsTransport;
use serde_json::Value as JsonValue;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// How long to wait for the close handshake before giving up
const CLOSE_TIMEOUT: Duration = Duration::from_secs(3);

/// Interactive commands
const COMMANDS: &[(&str, &str)] = &[
    ("/help", "Show this help"),
    ("/handlers", "List message names being printed"),
    ("/exit", "Close the connection and exit"),
    ("/quit", "Close the connection and exit"),
];

/// One parsed stdin line
#[derive(Debug, PartialEq)]
enum LineCommand {
    Send { name: String, payload: JsonValue },
    Help,
    Handlers,
    Quit,
    Empty,
    Unknown(String),
}

/// Register a stdout printer for each name
pub fn register_printers(bus: &MessageBus, names: &[String]) {
    for name in names {
        let label = name.clone();
        bus.receive(name.clone(), move |msg: JsonValue| {
            println!("{}: {}", label, msg);
        });
    }
}

/// Payload text is JSON when it parses, otherwise a plain string
fn parse_payload(raw: &str) -> JsonValue {
    serde_json::from_str(raw).unwrap_or_else(|_| JsonValue::String(raw.to_string()))
}

fn parse_line(line: &str) -> LineCommand {
    let line = line.trim();
    if line.is_empty() {
        return LineCommand::Empty;
    }

    if line.starts_with('/') {
        return match line {
            "/help" => LineCommand::Help,
            "/handlers" => LineCommand::Handlers,
            "/exit" | "/quit" => LineCommand::Quit,
            other => LineCommand::Unknown(other.to_string()),
        };
    }

    let (name, raw) = line.split_once(char::is_whitespace).unwrap_or((line, "null"));
    LineCommand::Send {
        name: name.to_string(),
        payload: parse_payload(raw.trim()),
    }
}

async fn close(transport: &WsTransport) {
    transport.close();
    if tokio::time::timeout(CLOSE_TIMEOUT, transport.closed()).await.is_err() {
        warn!("Timed out waiting for the socket to close");
    }
}

/// Send one message, then close after the frame is flushed
pub async fn send_once(
    bus: &MessageBus,
    transport: &WsTransport,
    name: &str,
    raw: &str,
) -> anyhow::Result<()> {
    bus.send(name, &parse_payload(raw))?;
    info!("Sent '{}'", name);
    close(transport).await;
    Ok(())
}

/// Print received messages until Ctrl+C or the server closes
pub async fn listen(bus: &MessageBus, transport: &WsTransport) -> anyhow::Result<()> {
    let names = bus.handler_names();
    if names.is_empty() {
        warn!("No message names to listen for; use --listen or AMBIORIX_LISTEN");
    } else {
        info!("Listening for {:?}", names);
    }
    info!("Press Ctrl+C to exit");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutting down...");
            close(transport).await;
        }
        _ = transport.closed() => {
            info!("Connection closed by server");
        }
    }
    Ok(())
}

/// Read `NAME JSON` lines from stdin and send them
pub async fn run_interactive(bus: &MessageBus, transport: &WsTransport) -> anyhow::Result<()> {
    print_welcome();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = transport.closed() => {
                println!("Connection closed");
                return Ok(());
            }
        };

        let Some(line) = line else {
            break;
        };

        match parse_line(&line) {
            LineCommand::Send { name, payload } => bus.send(&name, &payload)?,
            LineCommand::Help => print_commands(),
            LineCommand::Handlers => println!("{:?}", bus.handler_names()),
            LineCommand::Quit => break,
            LineCommand::Empty => {}
            LineCommand::Unknown(cmd) => println!("Unknown command: {} (try /help)", cmd),
        }
    }

    close(transport).await;
    Ok(())
}

fn print_welcome() {
    println!("Connected. Type `NAME JSON` to send a message, /help for commands.");
}

fn print_commands() {
    for (cmd, desc) in COMMANDS {
        println!("  {:<10} {}", cmd, desc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_payload() {
        assert_eq!(parse_payload(r#"{"n":1}"#), json!({"n": 1}));
        assert_eq!(parse_payload("42"), json!(42));
        assert_eq!(parse_payload("hello there"), json!("hello there"));
    }

    #[test]
    fn test_parse_send_line() {
        assert_eq!(
            parse_line(r#"ping {"n": 1}"#),
            LineCommand::Send {
                name: "ping".to_string(),
                payload: json!({"n": 1})
            }
        );
        assert_eq!(
            parse_line("refresh"),
            LineCommand::Send {
                name: "refresh".to_string(),
                payload: JsonValue::Null
            }
        );
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_line("   "), LineCommand::Empty);
        assert_eq!(parse_line("/help"), LineCommand::Help);
        assert_eq!(parse_line("/quit"), LineCommand::Quit);
        assert_eq!(parse_line("/handlers"), LineCommand::Handlers);
        assert_eq!(parse_line("/nope"), LineCommand::Unknown("/nope".to_string()));
    }

    #[test]
    fn test_printers_are_registered() {
        let bus = MessageBus::new(amb_core::MemoryTransport::new());
        register_printers(&bus, &["a".to_string(), "b".to_string()]);
        assert!(bus.is_registered("a"));
        assert!(bus.is_registered("b"));
        assert_eq!(bus.handler_count(), 2);
    }
}

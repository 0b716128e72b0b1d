mod config;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use sheetchat_client::{ChatEvent, ErrorKind, Session, SessionConfig, SessionError, run_poll_loop};
use sheetchat_store::{
    MemoryStore, RowStore, ServiceAccountKey, ServiceAccountTokenSource, SheetsConfig,
    SheetsStore, StaticToken, TokenSource,
};
use sheetchat_types::{Message, MessageKind};

use crate::config::{Backend, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout is the chat
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sheetchat=info,sheetchat_client=info,sheetchat_store=warn".into()),
        )
        .init();

    let config = Config::from_env()?;
    let store = build_store(&config.backend).await?;

    let session_config = SessionConfig {
        author: config.author,
        seed: config.seed,
    };
    let (session, history) = match Session::connect(session_config, store).await {
        Ok(connected) => connected,
        Err(e) => {
            error!("Connect failed: {}", e);
            match e.kind() {
                ErrorKind::Input => eprintln!("{}", e),
                ErrorKind::Transient => eprintln!("Invalid service account key or no table access"),
            }
            std::process::exit(1);
        }
    };

    for message in &history {
        render(message);
    }
    println!("-- connected as {}; /spin to spin, /quit to leave --", session.author());

    let session = Arc::new(session);
    let (events_tx, mut events_rx) = mpsc::channel(64);
    let poller = tokio::spawn(run_poll_loop(session.clone(), config.poll_interval, events_tx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            event = events_rx.recv() => match event {
                Some(ChatEvent::Message(message)) => render(&message),
                Some(ChatEvent::PollFailed(reason)) => eprintln!("! {}", reason),
                None => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = line.trim();
                let result = match input {
                    "" => continue,
                    "/quit" => break,
                    "/spin" => session.spin().await,
                    text => session.send(text, MessageKind::Text).await,
                };
                match result {
                    Ok(message) => render(&message),
                    Err(e) => report_send_error(&e),
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    poller.abort();
    let _ = poller.await;

    match Arc::try_unwrap(session) {
        Ok(session) => session.disconnect(),
        Err(_) => warn!("Session still shared at shutdown"),
    }

    Ok(())
}

async fn build_store(backend: &Backend) -> anyhow::Result<Arc<dyn RowStore>> {
    match backend {
        Backend::Offline => {
            info!("Offline mode: messages stay in this process");
            Ok(Arc::new(MemoryStore::new()))
        }
        Backend::Sheets {
            spreadsheet_id,
            sheet_name,
            service_account,
            access_token,
        } => {
            let http = reqwest::Client::new();

            let tokens: Arc<dyn TokenSource> = match (access_token, service_account) {
                (Some(token), _) => Arc::new(StaticToken(token.clone())),
                (None, Some(path)) => {
                    let key = ServiceAccountKey::from_file(path).await?;
                    info!("Using service account {}", key.client_email);
                    Arc::new(ServiceAccountTokenSource::new(http.clone(), key))
                }
                (None, None) => anyhow::bail!("No credentials configured"),
            };

            let sheets = SheetsConfig::new(spreadsheet_id.clone(), sheet_name.clone());
            Ok(Arc::new(SheetsStore::new(http, sheets, tokens)))
        }
    }
}

fn render(message: &Message) {
    let time = chrono::DateTime::from_timestamp_millis(message.ts)
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".into());

    match message.kind {
        MessageKind::Text => println!("[{}] {}: {}", time, message.author, message.text),
        MessageKind::Spin => println!("[{}] {} spins {}", time, message.author, message.text),
    }
}

fn report_send_error(e: &SessionError) {
    match e.kind() {
        ErrorKind::Input => eprintln!("! {}", e),
        ErrorKind::Transient => {
            warn!("Send failed: {}", e);
            eprintln!("! Failed to send message.");
        }
    }
}

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use agripulse::assistant::protocol::{ModelBackend, ModelReply, ModelRequest};
use agripulse::assistant::transcript::Role;
use agripulse::console::{parse_line, ConsoleInput, HELP};
use agripulse::error::ModelError;
use agripulse::kernel::time::SimTime;
use agripulse::services::llm::GeminiClient;
use agripulse::{Config, Session};

type PendingReply = JoinHandle<Result<ModelReply, ModelError>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("agripulse=info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load()?;
    let model = match GeminiClient::new(&config.model) {
        Ok(client) => {
            info!(model = client.model(), "Assistant backend ready");
            Some(client)
        }
        Err(e) => {
            warn!("Assistant offline: {}", e);
            None
        }
    };

    let mut session = Session::new(&config);

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        });
    }

    let (tx_input, mut rx_input) = mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx_input.send(line).await.is_err() {
                break;
            }
        }
    });

    println!("{}\n", HELP);

    let started = Instant::now();
    let mut cadence = tokio::time::interval(Duration::from_millis(100));
    cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut pending: Option<PendingReply> = None;
    let mut input_open = true;
    let mut printer = Printer::default();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = cadence.tick() => {
                session.advance_to(SimTime::from(started.elapsed()));
            }
            line = rx_input.recv(), if input_open => {
                let Some(line) = line else {
                    input_open = false;
                    continue;
                };
                match parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(ConsoleInput::Chat(text))) => match session.submit_message(&text) {
                        Ok(request) => pending = Some(start_call(model.as_ref(), request)),
                        Err(e) => println!("!! {}", e),
                    },
                    Ok(Some(ConsoleInput::Command(command))) => {
                        let detail = session.execute(command);
                        println!("-> {}", detail);
                    }
                    Ok(Some(ConsoleInput::Status)) => {
                        for node in session.state().nodes() {
                            println!("{}", node.headline());
                        }
                    }
                    Ok(Some(ConsoleInput::Dismiss)) => {
                        session.dismiss_alert();
                    }
                    Ok(Some(ConsoleInput::Help)) => println!("{}", HELP),
                    Ok(Some(ConsoleInput::Quit)) => break,
                    Err(e) => println!("!! {}", e),
                }
            }
            reply = await_reply(&mut pending) => {
                if let Some(next) = session.complete_model_call(reply) {
                    pending = Some(start_call(model.as_ref(), next));
                }
            }
        }

        printer.flush(&session);
        if !input_open && pending.is_none() {
            break;
        }
    }

    if let Some(handle) = pending.take() {
        handle.abort();
    }
    session.shutdown();
    Ok(())
}

/// Model calls run off the driver loop so ticks keep flowing.
fn start_call(model: Option<&GeminiClient>, request: ModelRequest) -> PendingReply {
    let model = model.cloned();
    tokio::spawn(async move {
        match model {
            Some(client) => client.generate(request).await,
            None => Err(ModelError::MissingApiKey),
        }
    })
}

async fn await_reply(pending: &mut Option<PendingReply>) -> Result<ModelReply, ModelError> {
    let Some(handle) = pending.as_mut() else {
        return std::future::pending().await;
    };
    let joined = handle.await;
    *pending = None;
    joined.unwrap_or_else(|e| Err(ModelError::Aborted(e.to_string())))
}

/// Echoes whatever changed since the last flush.
#[derive(Default)]
struct Printer {
    logs_seen: u64,
    messages_seen: usize,
    alert: Option<String>,
}

impl Printer {
    fn flush(&mut self, session: &Session) {
        let logs = &session.state().logs;
        let fresh = logs.recorded().saturating_sub(self.logs_seen) as usize;
        let entries: Vec<_> = logs.iter().take(fresh).collect();
        for entry in entries.into_iter().rev() {
            println!("{}", entry);
        }
        self.logs_seen = logs.recorded();

        let current = session.alert().map(|a| a.message.clone());
        if current != self.alert {
            if let Some(alert) = session.alert() {
                println!("!! [{:?}] {}", alert.severity, alert.message);
            }
            self.alert = current;
        }

        let visible: Vec<_> = session.transcript().visible().collect();
        for message in visible.iter().skip(self.messages_seen) {
            if message.role == Role::Assistant {
                println!("ARCHITECT> {}\n", message.text);
            }
        }
        self.messages_seen = visible.len();
    }
}

use anyhow::Result;
use std::io::Write;
use supportdesk::api::logging::init_tracing;
use supportdesk::api::ApiClient;
use supportdesk::config::Config;
use supportdesk::runtime::ChatRuntime;
use supportdesk::state::{ConversationManager, ConversationState, Speaker};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const PROMPT: &str = "you> ";
const HELP: &str = "commands: /reset clears the conversation, /once <message> asks without streaming, \
/health checks the backend, /quit exits. Ctrl-C cancels a running answer, or exits at the prompt.";

/// Prints the growing assistant turn without re-printing what is already on screen.
#[derive(Default)]
struct TurnPrinter {
    shown: String,
    started: bool,
}

impl TurnPrinter {
    fn render(&mut self, state: &ConversationState) -> Result<()> {
        let Some(turn) = state.turns().last() else {
            return Ok(());
        };
        if turn.speaker != Speaker::Assistant {
            return Ok(());
        }

        let mut stdout = std::io::stdout().lock();
        if !self.started {
            write!(stdout, "agent> ")?;
            self.started = true;
        }
        match turn.text.strip_prefix(self.shown.as_str()) {
            Some(fresh) => write!(stdout, "{fresh}")?,
            // Replaced rather than extended (fallback after a failure).
            None => write!(stdout, "\n{}", turn.text)?,
        }
        self.shown.clone_from(&turn.text);
        stdout.flush()?;
        Ok(())
    }

    fn finish(self, state: &ConversationState) -> Result<()> {
        println!();
        if let Some(banner) = state.error_banner() {
            eprintln!("[error] {banner}");
        }
        Ok(())
    }
}

fn prompt() -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    write!(stdout, "{PROMPT}")?;
    stdout.flush()?;
    Ok(())
}

/// Installs the SIGINT handler once for the whole process and forwards each
/// Ctrl-C as a message.
fn spawn_interrupt_listener() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

async fn stream_answer(
    runtime: &mut ChatRuntime,
    interrupts: &mut mpsc::UnboundedReceiver<()>,
) -> Result<()> {
    let mut printer = TurnPrinter::default();
    while runtime.state().is_loading() {
        tokio::select! {
            _ = runtime.next_update() => printer.render(runtime.state())?,
            Some(()) = interrupts.recv() => runtime.cancel(),
        }
    }
    printer.render(runtime.state())?;
    printer.finish(runtime.state())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = Config::load()?;
    config.validate()?;

    let client = ApiClient::new(&config)?;
    match client.health().await {
        Ok(health) if health.is_ok() => tracing::info!(service = ?health.service, "backend healthy"),
        Ok(health) => tracing::warn!(status = %health.status, "backend reports degraded health"),
        Err(error) => tracing::warn!(%error, "backend health check failed"),
    }

    let conversation = ConversationManager::new(client);
    let blocking_client = conversation.client();
    let mut runtime = ChatRuntime::new(conversation);

    let mut interrupts = spawn_interrupt_listener();

    println!("{HELP}");
    prompt()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
            Some(()) = interrupts.recv() => {
                println!();
                break;
            }
        };
        let input = line.trim();
        match input {
            "/quit" | "/exit" => break,
            "/reset" => {
                runtime.reset();
                println!("(conversation cleared)");
            }
            "/health" => match blocking_client.health().await {
                Ok(health) => println!("backend status: {}", health.status),
                Err(error) => eprintln!("[error] {error}"),
            },
            _ => {
                if let Some(message) = input.strip_prefix("/once ") {
                    match blocking_client.complete(message.trim()).await {
                        Ok(answer) => println!("agent> {answer}"),
                        Err(error) => eprintln!("[error] {error}"),
                    }
                } else if runtime.submit(input) {
                    stream_answer(&mut runtime, &mut interrupts).await?;
                }
            }
        }
        prompt()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use supportdesk::state::FALLBACK_MESSAGE;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_interrupt_cancels_running_answer_and_listener_survives() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(b"data: late\n\n".to_vec(), "text/event-stream")
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let config = Config {
            api_url: server.uri(),
            credential: None,
            tenant_id: None,
        };
        let client = ApiClient::new(&config).unwrap();
        let mut runtime = ChatRuntime::new(ConversationManager::new(client));
        let (tx, mut interrupts) = mpsc::unbounded_channel();

        assert!(runtime.submit("Hi"));
        tx.send(()).unwrap();
        tokio::time::timeout(
            Duration::from_secs(5),
            stream_answer(&mut runtime, &mut interrupts),
        )
        .await
        .expect("answer cancelled promptly")
        .unwrap();

        assert!(!runtime.state().is_loading());
        assert_eq!(runtime.state().turns()[1].text, FALLBACK_MESSAGE);
        assert_eq!(runtime.state().error_banner(), Some("request was cancelled"));

        // The same channel still delivers the next Ctrl-C, which the prompt loop
        // treats as a request to exit.
        tx.send(()).unwrap();
        assert_eq!(interrupts.recv().await, Some(()));
    }
}

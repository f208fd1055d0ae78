//! Interactive conversation loop.
//!
//! Reads one line per turn, forwards it to the session and prints the reply
//! with an `assistant:` label. Generic over its input and output so tests
//! can drive it from memory.

use std::sync::Arc;

use friendly_ai::{ChatError, CompletionGateway, ConversationSession};
use friendly_common::{AgentError, SessionId};
use friendly_config::PersonaConfig;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const REPLY_LABEL: &str = "assistant:";
const PROMPT: &str = "You: ";

/// Inputs that end the conversation, compared case-insensitively.
const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "bye"];

/// One parsed line of user input.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Empty,
    Exit,
    Reset,
    Usage,
    Message(&'a str),
}

pub fn parse_input(line: &str) -> Input<'_> {
    let text = line.trim();
    if text.is_empty() {
        Input::Empty
    } else if is_exit_command(text) {
        Input::Exit
    } else if text == "/reset" {
        Input::Reset
    } else if text == "/usage" {
        Input::Usage
    } else {
        Input::Message(text)
    }
}

/// Whether `input` (the whole line) is one of the exit sentinels.
pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim();
    EXIT_COMMANDS
        .iter()
        .any(|command| input.eq_ignore_ascii_case(command))
}

/// The single-user conversation loop.
pub struct Repl {
    session: ConversationSession,
    gateway: Arc<dyn CompletionGateway>,
    persona: PersonaConfig,
}

impl Repl {
    pub fn new(gateway: Arc<dyn CompletionGateway>, persona: PersonaConfig) -> Self {
        let session = new_session(&gateway, &persona);
        Self {
            session,
            gateway,
            persona,
        }
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// Run until an exit sentinel or end of input.
    ///
    /// Input that is not valid UTF-8 is decoded lossily rather than ending
    /// the conversation.
    pub async fn run<R, W>(&mut self, mut input: R, output: &mut W) -> Result<(), AgentError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let name = self.persona.name.clone();
        write(output, &format!("{name}: {}\n", self.persona.greeting)).await?;
        write(output, "(Type 'exit' to end the conversation)\n").await?;

        let mut buf = Vec::new();
        loop {
            write(output, PROMPT).await?;

            buf.clear();
            if input.read_until(b'\n', &mut buf).await? == 0 {
                write(output, &format!("\n{name}: {}\n", self.persona.farewell)).await?;
                return Ok(());
            }
            let line = String::from_utf8_lossy(&buf);

            match parse_input(&line) {
                Input::Empty => continue,
                Input::Exit => {
                    write(output, &format!("{name}: {}\n", self.persona.farewell)).await?;
                    return Ok(());
                }
                Input::Reset => {
                    self.reset();
                    write(output, "(conversation reset)\n").await?;
                }
                Input::Usage => {
                    let summary = self.session.tracker().summary();
                    write(output, &format!("({summary})\n")).await?;
                }
                Input::Message(text) => {
                    tracing::debug!(session = %self.session.id(), text, "user turn");
                    match self.session.send(text).await {
                        Ok(reply) => {
                            write(output, &format!("{REPLY_LABEL} {reply}\n")).await?;
                        }
                        Err(ChatError::Gateway(e)) => {
                            write(
                                output,
                                &format!("{REPLY_LABEL} I encountered an error: {e}\n"),
                            )
                            .await?;
                        }
                        Err(e @ ChatError::Closed(_)) => return Err(e.into()),
                    }
                }
            }
        }
    }

    /// Replace the conversation with a fresh one.
    fn reset(&mut self) {
        self.session.close();
        self.session = new_session(&self.gateway, &self.persona);
        tracing::info!(session = %self.session.id(), "conversation reset");
    }
}

fn new_session(
    gateway: &Arc<dyn CompletionGateway>,
    persona: &PersonaConfig,
) -> ConversationSession {
    ConversationSession::create(SessionId::new(), gateway.clone(), &persona.system_prompt)
        .with_context_window(persona.context_window as usize)
}

async fn write<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> std::io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use friendly_ai::{GatewayError, Message, ScriptedGateway};

    fn persona() -> PersonaConfig {
        PersonaConfig {
            system_prompt: "S".into(),
            ..PersonaConfig::default()
        }
    }

    async fn run_with(gateway: Arc<ScriptedGateway>, input: &str) -> (Repl, String) {
        let mut repl = Repl::new(gateway, persona());
        let mut output = Vec::new();
        repl.run(input.as_bytes(), &mut output).await.unwrap();
        (repl, String::from_utf8(output).unwrap())
    }

    #[test]
    fn exit_sentinels_are_case_insensitive() {
        for input in ["exit", "EXIT", "Quit", "bye", "  Bye  "] {
            assert!(is_exit_command(input), "{input} should exit");
        }
        for input in ["exiting", "goodbye", "quit now", ""] {
            assert!(!is_exit_command(input), "{input} should not exit");
        }
    }

    #[test]
    fn parse_input_variants() {
        assert_eq!(parse_input("   "), Input::Empty);
        assert_eq!(parse_input("Quit"), Input::Exit);
        assert_eq!(parse_input("/reset"), Input::Reset);
        assert_eq!(parse_input("/usage"), Input::Usage);
        assert_eq!(parse_input("  hello there "), Input::Message("hello there"));
    }

    #[tokio::test]
    async fn replies_are_labelled_and_exit_says_goodbye() {
        let gateway = Arc::new(ScriptedGateway::new().with_reply("A1"));
        let (repl, output) = run_with(gateway, "hi\nEXIT\nnever sent\n").await;

        assert!(output.starts_with("Friendly Agent: Hello!"));
        assert!(output.contains("assistant: A1\n"));
        assert!(output.contains("Friendly Agent: Goodbye! Have a great day!"));
        assert_eq!(
            repl.session().transcript(),
            &[
                Message::system("S"),
                Message::user("hi"),
                Message::assistant("A1"),
            ]
        );
    }

    #[tokio::test]
    async fn gateway_failure_is_shown_and_loop_continues() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .with_failure(GatewayError::NetworkError("timeout".into()))
                .with_reply("recovered"),
        );
        let (repl, output) = run_with(gateway.clone(), "first\nsecond\nbye\n").await;

        assert!(output.contains("assistant: I encountered an error: network error: timeout"));
        assert!(output.contains("assistant: recovered"));
        assert_eq!(repl.session().message_count(), 4);
        assert_eq!(gateway.received()[1].len(), 3);
    }

    #[tokio::test]
    async fn end_of_input_ends_gracefully() {
        let gateway = Arc::new(ScriptedGateway::new().with_reply("A1"));
        let (_repl, output) = run_with(gateway, "hi\n").await;
        assert!(output.trim_end().ends_with("Goodbye! Have a great day!"));
    }

    #[tokio::test]
    async fn blank_lines_are_not_sent() {
        let gateway = Arc::new(ScriptedGateway::new());
        let (repl, _output) = run_with(gateway.clone(), "\n   \nquit\n").await;
        assert_eq!(gateway.call_count(), 0);
        assert_eq!(repl.session().message_count(), 1);
    }

    #[tokio::test]
    async fn exiting_is_an_ordinary_message() {
        let gateway = Arc::new(ScriptedGateway::new().with_reply("ok"));
        let (repl, _output) = run_with(gateway, "exiting\nexit\n").await;
        assert_eq!(repl.session().transcript()[1], Message::user("exiting"));
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_end_the_conversation() {
        let gateway = Arc::new(ScriptedGateway::new().with_reply("A1").with_reply("A2"));
        let mut repl = Repl::new(gateway.clone(), persona());
        let mut output = Vec::new();

        repl.run(&b"caf\xe9\nhello\nexit\n"[..], &mut output)
            .await
            .unwrap();

        assert_eq!(gateway.call_count(), 2);
        assert_eq!(
            repl.session().transcript()[1],
            Message::user("caf\u{FFFD}")
        );
        assert_eq!(repl.session().transcript()[3], Message::user("hello"));
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("assistant: A2"));
        assert!(output.contains("Goodbye! Have a great day!"));
    }

    #[tokio::test]
    async fn crlf_line_endings_are_trimmed() {
        let gateway = Arc::new(ScriptedGateway::new().with_reply("A1"));
        let (repl, _output) = run_with(gateway, "hi\r\nQUIT\r\n").await;
        assert_eq!(repl.session().transcript()[1], Message::user("hi"));
        assert_eq!(repl.session().message_count(), 3);
    }

    #[tokio::test]
    async fn reset_starts_a_fresh_session() {
        let gateway = Arc::new(ScriptedGateway::new().with_reply("A1").with_reply("A2"));
        let (repl, output) = run_with(gateway.clone(), "hi\n/reset\nhello\nexit\n").await;

        assert!(output.contains("(conversation reset)"));
        assert_eq!(
            repl.session().transcript(),
            &[
                Message::system("S"),
                Message::user("hello"),
                Message::assistant("A2"),
            ]
        );
        assert_eq!(
            gateway.received()[1],
            vec![Message::system("S"), Message::user("hello")]
        );
    }

    #[tokio::test]
    async fn usage_reports_tracker_summary() {
        let gateway = Arc::new(ScriptedGateway::new().with_reply("one two"));
        let (_repl, output) = run_with(gateway, "hi\n/usage\nexit\n").await;
        assert!(output.contains("(1 calls, 2 prompt tokens, 2 completion tokens (4 total))"));
    }
}

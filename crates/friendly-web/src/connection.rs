//! Per-connection handler: start a session, then answer chat frames.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;

use friendly_ai::SessionRegistry;
use friendly_config::PersonaConfig;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::WebSocketStream;

use crate::handler::ChatHandler;
use crate::protocol::{ClientFrame, ServerFrame};

type WsSink<S> = SplitSink<WebSocketStream<S>, Message>;
type WsStream<S> = SplitStream<WebSocketStream<S>>;

/// Handle a single WebSocket connection until the client leaves.
pub async fn handle_connection<S>(
    ws: WebSocketStream<S>,
    addr: SocketAddr,
    registry: SessionRegistry,
    persona: Arc<PersonaConfig>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut sink, mut stream) = ws.split();
    let mut handler = ChatHandler::new(registry, persona);

    tracing::info!(peer = %addr, session = %handler.session_id(), "Client connected");

    if send_frames(&mut sink, handler.start().await).await.is_err() {
        handler.end().await;
        return;
    }

    // Text frames that arrived while a turn was running.
    let mut pending: VecDeque<String> = VecDeque::new();

    loop {
        let text = match pending.pop_front() {
            Some(text) => text,
            None => match next_text(&mut sink, &mut stream, addr).await {
                Some(text) => text,
                None => break,
            },
        };

        let frame = match serde_json::from_str::<ClientFrame>(&text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(peer = %addr, error = %e, "Invalid client frame");
                let error = ServerFrame::error(format!("Invalid message: {e}"));
                if send_frame(&mut sink, &error).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let sent = match frame {
            ClientFrame::Message { content } => {
                if content.trim().is_empty() {
                    send_frame(&mut sink, &handler.reply(&content).await).await
                } else {
                    if send_frame(&mut sink, &ServerFrame::Thinking).await.is_err() {
                        break;
                    }
                    match run_turn(&handler, &content, &mut sink, &mut stream, &mut pending).await {
                        Some(reply) => send_frame(&mut sink, &reply).await,
                        None => {
                            tracing::debug!(
                                peer = %addr,
                                session = %handler.session_id(),
                                "Client left mid-turn"
                            );
                            break;
                        }
                    }
                }
            }
            ClientFrame::Reset => send_frames(&mut sink, handler.reset().await).await,
        };

        if sent.is_err() {
            break;
        }
    }

    tracing::info!(peer = %addr, session = %handler.session_id(), "Client disconnected");
    handler.end().await;
}

/// Run one turn while still watching the socket.
///
/// Returns `None` if the client disconnects first; the turn is then dropped
/// and the transcript is left as after a failed turn.
async fn run_turn<S>(
    handler: &ChatHandler,
    content: &str,
    sink: &mut WsSink<S>,
    stream: &mut WsStream<S>,
    pending: &mut VecDeque<String>,
) -> Option<ServerFrame>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let reply = handler.reply(content);
    tokio::pin!(reply);

    loop {
        tokio::select! {
            biased;

            frame = &mut reply => return Some(frame),

            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => pending.push_back(text.to_string()),
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return None,
                    _ => {}
                }
            }
        }
    }
}

/// Wait for the next text frame, answering pings on the way.
async fn next_text<S>(
    sink: &mut WsSink<S>,
    stream: &mut WsStream<S>,
    addr: SocketAddr,
) -> Option<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => return Some(text.to_string()),
            Some(Ok(Message::Ping(data))) => {
                let _ = sink.send(Message::Pong(data)).await;
            }
            Some(Ok(Message::Close(_))) | None => return None,
            Some(Err(e)) => {
                tracing::debug!(peer = %addr, error = %e, "WS error");
                return None;
            }
            _ => {}
        }
    }
}

async fn send_frame<S>(sink: &mut WsSink<S>, frame: &ServerFrame) -> Result<(), WsError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    sink.send(Message::Text(frame.to_json().into())).await
}

async fn send_frames<S>(sink: &mut WsSink<S>, frames: Vec<ServerFrame>) -> Result<(), WsError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    for frame in &frames {
        send_frame(sink, frame).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use friendly_ai::{
        Completion, CompletionGateway, GatewayError, Message as Entry, ScriptedGateway,
    };
    use serde_json::Value;
    use tokio::net::TcpListener;
    use tokio_tungstenite::{accept_async, connect_async};

    type Client = WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

    async fn serve(registry: SessionRegistry) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let persona = Arc::new(PersonaConfig {
            system_prompt: "S".into(),
            ..PersonaConfig::default()
        });
        tokio::spawn(async move {
            while let Ok((stream, peer)) = listener.accept().await {
                let registry = registry.clone();
                let persona = persona.clone();
                tokio::spawn(async move {
                    let ws = accept_async(stream).await.unwrap();
                    handle_connection(ws, peer, registry, persona).await;
                });
            }
        });
        format!("ws://{addr}")
    }

    /// Gateway whose calls never complete. Records when an in-flight call
    /// is dropped.
    #[derive(Default)]
    struct StalledGateway {
        dropped: Arc<AtomicBool>,
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl CompletionGateway for StalledGateway {
        async fn complete(&self, _transcript: &[Entry]) -> Result<Completion, GatewayError> {
            let _flag = DropFlag(self.dropped.clone());
            std::future::pending::<Result<Completion, GatewayError>>().await
        }
    }

    async fn recv(client: &mut Client) -> Value {
        loop {
            match client.next().await.unwrap().unwrap() {
                Message::Text(text) => return serde_json::from_str(&text).unwrap(),
                _ => continue,
            }
        }
    }

    async fn send(client: &mut Client, json: &str) {
        client.send(Message::Text(json.to_string().into())).await.unwrap();
    }

    #[tokio::test]
    async fn full_conversation_over_websocket() {
        let gateway = Arc::new(ScriptedGateway::new().with_reply("A1"));
        let registry = SessionRegistry::with_gateway(gateway.clone());
        let url = serve(registry.clone()).await;
        let (mut client, _) = connect_async(url.as_str()).await.unwrap();

        assert_eq!(recv(&mut client).await["type"], "session_ready");
        let greeting = recv(&mut client).await;
        assert_eq!(greeting["type"], "message");
        assert_eq!(greeting["author"], "Friendly Agent");
        assert_eq!(registry.count().await, 1);

        send(&mut client, r#"{"type":"message","content":"hi"}"#).await;
        assert_eq!(recv(&mut client).await["type"], "thinking");
        let reply = recv(&mut client).await;
        assert_eq!(reply["content"], "A1");

        send(&mut client, r#"{"type":"message","content":"  "}"#).await;
        let error = recv(&mut client).await;
        assert_eq!(error["type"], "error");
        assert_eq!(error["content"], "Message cannot be empty");

        send(&mut client, "not json").await;
        assert_eq!(recv(&mut client).await["type"], "error");

        client.close(None).await.unwrap();
        for _ in 0..50 {
            if registry.count().await == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(registry.count().await, 0);
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn reset_over_websocket_issues_new_session() {
        let registry = SessionRegistry::with_gateway(Arc::new(ScriptedGateway::new()));
        let url = serve(registry.clone()).await;
        let (mut client, _) = connect_async(url.as_str()).await.unwrap();

        let first = recv(&mut client).await["session_id"].clone();
        recv(&mut client).await;

        send(&mut client, r#"{"type":"reset"}"#).await;
        let second = recv(&mut client).await;
        assert_eq!(second["type"], "session_ready");
        assert_ne!(second["session_id"], first);
        assert_eq!(recv(&mut client).await["type"], "message");
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn closing_mid_turn_cancels_the_call_and_frees_the_session() {
        let gateway = Arc::new(StalledGateway::default());
        let dropped = gateway.dropped.clone();
        let registry = SessionRegistry::with_gateway(gateway);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let server_registry = registry.clone();
        let server = tokio::spawn(async move {
            let (stream, peer) = listener.accept().await.unwrap();
            let ws = accept_async(stream).await.unwrap();
            let persona = Arc::new(PersonaConfig::default());
            handle_connection(ws, peer, server_registry, persona).await;
        });

        let (mut client, _) = connect_async(url.as_str()).await.unwrap();
        assert_eq!(recv(&mut client).await["type"], "session_ready");
        assert_eq!(recv(&mut client).await["type"], "message");

        send(&mut client, r#"{"type":"message","content":"hi"}"#).await;
        assert_eq!(recv(&mut client).await["type"], "thinking");
        client.close(None).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("connection handler should return after close")
            .unwrap();
        assert!(dropped.load(Ordering::SeqCst));
        assert_eq!(registry.count().await, 0);
    }
}

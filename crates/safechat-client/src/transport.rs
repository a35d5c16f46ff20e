//! Transport seam between the connection manager and the socket.
//!
//! One `String` item is one text frame carrying one encoded envelope. The
//! stream ends on a close frame; an `Err` item is an abnormal close.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{future, Sink, SinkExt, Stream, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use safechat_core::error::{Result, SafechatError};

pub type FrameSink = Pin<Box<dyn Sink<String, Error = SafechatError> + Send>>;
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// An open connection, split into its write and read halves.
pub struct Transport {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

impl Transport {
    pub fn new<S, T>(sink: S, stream: T) -> Self
    where
        S: Sink<String, Error = SafechatError> + Send + 'static,
        T: Stream<Item = Result<String>> + Send + 'static,
    {
        Self {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        }
    }
}

/// Opens transports. The connection manager calls this once per attempt.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<Transport>;
}

/// WebSocket connector over tokio-tungstenite (`ws://` and `wss://`).
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Transport> {
        let (ws, _resp) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| SafechatError::Transport(format!("connect failed: {e}")))?;
        let (write, read) = ws.split();

        let sink = write
            .sink_map_err(|e| SafechatError::Transport(format!("send failed: {e}")))
            .with(|frame: String| future::ready(Ok::<_, SafechatError>(Message::text(frame))));

        let stream = read
            .take_while(|msg| future::ready(!matches!(msg, Ok(Message::Close(_)))))
            .filter_map(|msg| {
                future::ready(match msg {
                    Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                    Ok(Message::Binary(_)) => {
                        tracing::warn!("ignoring binary frame on text channel");
                        None
                    }
                    Ok(_) => None,
                    Err(e) => Some(Err(SafechatError::Transport(format!("recv failed: {e}")))),
                })
            });

        Ok(Transport::new(sink, stream))
    }
}

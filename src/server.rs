use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::handlers::{self, ServerContext};
use crate::protocol::{JsonRpcError, JsonRpcResponse};

/// Maximum bytes per JSON-RPC message (1 MiB).
const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// Responses waiting to be written.
const OUTBOUND_QUEUE: usize = 64;

/// MCP server that communicates over stdio using newline-delimited JSON-RPC 2.0.
///
/// Every request is dispatched on its own task, so a tool call waiting out
/// a rate limit never holds up other requests. Responses go through a
/// single writer and may be emitted in any order.
pub struct McpServer {
    ctx: Arc<ServerContext>,
}

impl McpServer {
    pub fn new(ctx: ServerContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve one connection until the input reaches EOF and all in-flight
    /// requests have been answered.
    pub async fn serve<R, W>(&self, input: R, output: W) -> Result<(), Box<dyn std::error::Error>>
    where
        R: tokio::io::AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<JsonRpcResponse>(OUTBOUND_QUEUE);
        let writer = tokio::spawn(write_responses(rx, output));

        let mut reader = BufReader::new(input);
        let mut raw = Vec::new();

        loop {
            raw.clear();
            let n = (&mut reader)
                .take(MAX_MESSAGE_BYTES as u64 + 1)
                .read_until(b'\n', &mut raw)
                .await?;
            if n == 0 {
                break;
            }

            if n > MAX_MESSAGE_BYTES {
                let skipped = if raw.last() == Some(&b'\n') {
                    0
                } else {
                    discard_line(&mut reader).await?
                };
                warn!(bytes = n + skipped, limit = MAX_MESSAGE_BYTES, "Message too large");
                send(&tx, JsonRpcResponse::error(None, JsonRpcError::parse_error("message too large"))).await;
                continue;
            }

            let line = match std::str::from_utf8(&raw) {
                Ok(s) => s.trim().to_string(),
                Err(_) => {
                    send(&tx, JsonRpcResponse::error(None, JsonRpcError::parse_error("invalid UTF-8"))).await;
                    continue;
                }
            };

            if line.is_empty() {
                continue;
            }

            let ctx = Arc::clone(&self.ctx);
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(resp) = handlers::handle_message(&line, &ctx).await {
                    send(&tx, resp).await;
                }
            });
        }

        info!("Input closed, waiting for in-flight requests");
        drop(tx);

        match writer.await {
            Ok(result) => result.map_err(Into::into),
            Err(e) => Err(Box::new(e)),
        }
    }
}

/// Skip the rest of the current line without buffering it.
async fn discard_line<R>(reader: &mut R) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut skipped = 0;
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(skipped);
        }
        match buf.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(skipped + pos + 1);
            }
            None => {
                let len = buf.len();
                reader.consume(len);
                skipped += len;
            }
        }
    }
}

async fn send(tx: &mpsc::Sender<JsonRpcResponse>, resp: JsonRpcResponse) {
    if tx.send(resp).await.is_err() {
        error!("Response writer stopped, dropping response");
    }
}

async fn write_responses<W>(mut rx: mpsc::Receiver<JsonRpcResponse>, mut out: W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(resp) = rx.recv().await {
        let json = serde_json::to_string(&resp)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        out.write_all(json.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
    }
    Ok(())
}

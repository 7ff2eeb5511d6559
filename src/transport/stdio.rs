//! Line-delimited JSON-RPC over stdio

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::rpc_codes;
use crate::gateway::McpServer;
use crate::protocol::JsonRpcResponse;
use crate::{Error, Result};

/// Serve MCP on the process's stdin/stdout until stdin closes
pub async fn run_stdio(server: Arc<McpServer>) -> Result<()> {
    serve(server, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

/// Serve MCP over any line-oriented reader/writer pair.
///
/// Each request runs on its own task; responses go through a single writer
/// task so frames never interleave. A line that is not valid UTF-8 gets a
/// parse error and the session continues. On EOF or a read failure, in-flight
/// requests are drained and the writer flushed before returning.
pub async fn serve<R, W>(server: Arc<McpServer>, mut reader: R, writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer_task = tokio::spawn(async move {
        let mut writer = BufWriter::new(writer);
        while let Some(frame) = rx.recv().await {
            writer.write_all(frame.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        writer.shutdown().await
    });

    info!("Serving MCP over stdio");
    let mut in_flight = JoinSet::new();
    let mut buf = Vec::new();
    let mut read_error = None;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "Failed to read stdin");
                read_error = Some(e);
                break;
            }
        }

        let line = match String::from_utf8(std::mem::take(&mut buf)) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Input line is not valid UTF-8");
                send_response(
                    &tx,
                    &JsonRpcResponse::error(
                        None,
                        rpc_codes::PARSE_ERROR,
                        "Parse error: line is not valid UTF-8",
                    ),
                );
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let server = Arc::clone(&server);
        let tx = tx.clone();
        in_flight.spawn(async move {
            if let Some(response) = server.handle_line(&line).await {
                send_response(&tx, &response);
            }
        });

        while let Some(finished) = in_flight.try_join_next() {
            if let Err(e) = finished {
                error!(error = %e, "Request task failed");
            }
        }
    }

    debug!(pending = in_flight.len(), "Input closed, draining requests");
    while let Some(finished) = in_flight.join_next().await {
        if let Err(e) = finished {
            error!(error = %e, "Request task failed");
        }
    }

    drop(tx);
    writer_task
        .await
        .map_err(|e| Error::Internal(format!("writer task failed: {e}")))?
        .map_err(|e| Error::Transport(format!("stdout write failed: {e}")))?;

    if let Some(e) = read_error {
        return Err(e.into());
    }

    info!("Stdio session closed");
    Ok(())
}

fn send_response(tx: &mpsc::UnboundedSender<String>, response: &JsonRpcResponse) {
    match serde_json::to_string(response) {
        Ok(frame) => {
            if tx.send(frame).is_err() {
                error!("Writer closed before response could be sent");
            }
        }
        Err(e) => error!(error = %e, "Failed to serialize response"),
    }
}

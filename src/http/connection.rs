use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout, timeout_at};

use crate::config::ServerConfig;
use crate::http::parser::{
    ParseError, find_headers_end, first_line, parse_http_request, parse_request_line,
    parse_truncated_request,
};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::routing::Router;

const READ_CHUNK: usize = 1024;

/// One accepted connection, from first read to close.
///
/// Exactly one response is written per connection and the stream is shut
/// down afterwards.
pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    state: ConnectionState,
    router: Arc<Router>,
    config: Arc<ServerConfig>,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter),
    Closed,
}

/// What the read phase produced.
#[derive(Debug)]
pub enum ReadOutcome {
    Request(Request),
    Malformed(ParseError),
    /// Peer went away without sending anything but whitespace.
    Disconnected,
    /// The read deadline passed before the head was complete.
    TimedOut,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, router: Arc<Router>, config: Arc<ServerConfig>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            state: ConnectionState::Reading,
            router,
            config,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await? {
                        ReadOutcome::Request(req) => ConnectionState::Processing(req),
                        ReadOutcome::Malformed(e) => {
                            tracing::warn!(error = %e, "rejecting malformed request");
                            let response = Response::bad_request();
                            Self::log_response(None, &response);
                            ConnectionState::Writing(ResponseWriter::new(&response))
                        }
                        ReadOutcome::Disconnected => {
                            tracing::debug!("peer closed before sending a request");
                            ConnectionState::Closed
                        }
                        ReadOutcome::TimedOut => {
                            tracing::warn!(
                                timeout_ms = self.config.read_timeout_ms,
                                "read deadline expired, closing"
                            );
                            ConnectionState::Closed
                        }
                    };
                }

                ConnectionState::Processing(req) => {
                    let response = self.router.dispatch(&req).await;
                    Self::log_response(Some(&req), &response);
                    self.state = ConnectionState::Writing(ResponseWriter::new(&response));
                }

                ConnectionState::Writing(mut writer) => {
                    let limit = self.config.write_timeout();
                    let result = timeout(limit, writer.write_to_stream(&mut self.stream)).await;
                    match result {
                        Ok(res) => res?,
                        Err(_) => anyhow::bail!(
                            "write deadline expired after {} of {} bytes",
                            writer.written(),
                            writer.total_len()
                        ),
                    }

                    // No keep-alive: one response, then close.
                    let _ = self.stream.shutdown().await;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => break,
            }
        }

        Ok(())
    }

    /// Collects the request head and parses it.
    ///
    /// Reading stops at the blank line, at end of stream, or once
    /// `max_request_bytes` have been buffered. A request line that is already
    /// known to be bad is rejected without waiting for the rest. A head cut
    /// off by the size limit only keeps its complete lines.
    pub async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        let deadline = Instant::now() + self.config.read_timeout();
        let limit = self.config.max_request_bytes;

        loop {
            if let Some(line) = first_line(&self.buffer) {
                if let Err(e) = parse_request_line(line) {
                    return Ok(ReadOutcome::Malformed(e));
                }
            }

            if find_headers_end(&self.buffer).is_some() || self.buffer.len() >= limit {
                break;
            }

            let mut temp = [0u8; READ_CHUNK];
            let want = READ_CHUNK.min(limit - self.buffer.len());
            let n = match timeout_at(deadline, self.stream.read(&mut temp[..want])).await {
                Ok(res) => res?,
                Err(_) => return Ok(ReadOutcome::TimedOut),
            };

            if n == 0 {
                // Client closed its write half
                break;
            }

            self.buffer.extend_from_slice(&temp[..n]);
        }

        if self.buffer.iter().all(u8::is_ascii_whitespace) {
            return Ok(ReadOutcome::Disconnected);
        }

        let truncated =
            self.buffer.len() >= limit && find_headers_end(&self.buffer).is_none();
        let parsed = if truncated {
            tracing::debug!(limit, "request head hit the size limit");
            parse_truncated_request(&self.buffer)
        } else {
            parse_http_request(&self.buffer)
        };

        Ok(match parsed {
            Ok(req) => ReadOutcome::Request(req),
            Err(e) => ReadOutcome::Malformed(e),
        })
    }

    fn log_response(req: Option<&Request>, response: &Response) {
        match req {
            Some(req) => tracing::info!(
                method = %req.method,
                path = %req.path,
                status = response.status.as_u16(),
                bytes = response.body.len(),
                "request handled"
            ),
            None => tracing::info!(status = response.status.as_u16(), "request rejected"),
        }
    }
}

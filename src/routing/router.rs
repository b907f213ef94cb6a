//! Route table and dispatch.
//!
//! Rules are checked in order and the first one that matches and accepts the
//! request produces the response. A rule whose precondition fails (for
//! example `/user-agent` without the header) lets evaluation continue with
//! the next rule. Nothing matching means 404.
//!
//! The table is built once at startup and only read afterwards, so a single
//! `Arc<Router>` is shared by every connection without locking.

use bytes::Bytes;

use crate::files::{FileError, FileStore};
use crate::http::request::Request;
use crate::http::response::Response;

/// How a rule compares against the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Exact(&'static str),
    Prefix(&'static str),
}

impl Pattern {
    /// Returns the part of `path` after the pattern, or `None` if it does not
    /// apply. Exact matches leave an empty remainder.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        match *self {
            Pattern::Exact(p) => (path == p).then_some(""),
            Pattern::Prefix(p) => path.strip_prefix(p),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Root,
    UserAgent,
    Echo,
    Files,
}

impl Handler {
    pub fn name(&self) -> &'static str {
        match self {
            Handler::Root => "root",
            Handler::UserAgent => "user-agent",
            Handler::Echo => "echo",
            Handler::Files => "files",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub pattern: Pattern,
    pub handler: Handler,
}

const DEFAULT_ROUTES: [Route; 4] = [
    Route {
        pattern: Pattern::Exact("/"),
        handler: Handler::Root,
    },
    Route {
        pattern: Pattern::Exact("/user-agent"),
        handler: Handler::UserAgent,
    },
    Route {
        pattern: Pattern::Prefix("/echo/"),
        handler: Handler::Echo,
    },
    Route {
        pattern: Pattern::Prefix("/files/"),
        handler: Handler::Files,
    },
];

pub struct Router {
    routes: Vec<Route>,
    files: FileStore,
}

impl Router {
    /// The standard table with `/files/` served from `files`.
    pub fn new(files: FileStore) -> Self {
        Self {
            routes: DEFAULT_ROUTES.to_vec(),
            files,
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub async fn dispatch(&self, req: &Request) -> Response {
        for route in &self.routes {
            let Some(rest) = route.pattern.strip(&req.path) else {
                continue;
            };

            if let Some(response) = self.apply(route.handler, req, rest).await {
                tracing::debug!(route = route.handler.name(), path = %req.path, "route matched");
                return response;
            }
        }

        tracing::debug!(path = %req.path, "no route matched");
        Response::not_found()
    }

    /// `None` means the rule declined and the next one should be tried.
    async fn apply(&self, handler: Handler, req: &Request, rest: &str) -> Option<Response> {
        match handler {
            Handler::Root => Some(Response::ok()),
            Handler::UserAgent => req
                .user_agent()
                .map(|ua| Response::text(Bytes::copy_from_slice(ua))),
            Handler::Echo => Some(Response::text(Bytes::copy_from_slice(rest.as_bytes()))),
            Handler::Files => Some(self.serve_file(rest).await),
        }
    }

    async fn serve_file(&self, name: &str) -> Response {
        match self.files.read(name).await {
            Ok(data) => Response::octet_stream(data),
            Err(FileError::NotFound(_)) => Response::not_found(),
            Err(e @ FileError::Rejected(_)) => {
                tracing::warn!(error = %e, "refusing file request");
                Response::not_found()
            }
            Err(e @ FileError::Io { .. }) => {
                tracing::error!(error = %e, "file read failed");
                Response::not_found()
            }
        }
    }
}

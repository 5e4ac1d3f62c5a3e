//! Request routing.
//!
//! | Request                          | Action               |
//! |----------------------------------|----------------------|
//! | `GET /events/new?name=<name>`    | create an event      |
//! | `GET /announcements.json`        | list active events   |
//! | `POST /<event>/<talk>[?testOnly=true]` | stream the body |

use std::io;

use lectern_core::LecternError;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::context::Context;
use crate::request::{Request, read_request};
use crate::response::{Response, Status};

const CHUNKED_UNSUPPORTED: &str = "Sorry, the server doesn't support chunked transfer encoding yet. \
If you use ffmpeg please add the \"-chunked_post 0\" option before the target URL.";
const CREATE_FAILED: &str =
    "Sorry, could not create new event. Something went wrong here. Please look at the server log.";
const LIST_FAILED: &str = "Sorry, could not list the announced events. Please look at the server log.";
const STREAM_FAILED: &str = "Sorry, something went wrong. Could not find the event you want to stream to \
or the streaming is broken. Please create it first or look at the server log.";
const UNKNOWN_ROUTE: &str = "Sorry, no idea what to do with the URL you requested.";

/// Handle the single request arriving on `input` and write the response to
/// `output`. A connection without a request line produces no output.
pub async fn handle_connection<R, W>(ctx: &Context, input: R, output: &mut W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + ?Sized,
{
    let Some(mut request) = read_request(input).await? else {
        tracing::debug!("Connection without request line, ignoring it");
        return Ok(());
    };

    tracing::info!("HTTP Request: {} {}", request.method, request.target);

    // The body must not be touched for chunked uploads.
    let response = if request.is_chunked() {
        reject_chunked()
    } else {
        route(ctx, &mut request).await
    };

    response.write_to(output).await
}

fn reject_chunked() -> Response {
    let err = LecternError::Protocol("chunked transfer encoding is not supported".into());
    tracing::warn!("{}", err);
    Response::text(Status::for_error(&err), CHUNKED_UNSUPPORTED)
}

async fn route<R>(ctx: &Context, request: &mut Request<R>) -> Response
where
    R: AsyncBufRead + Unpin,
{
    match request.method.as_str() {
        "GET" if request.path == "/events/new" => match request.query_param("name") {
            Some(name) => create_event(ctx, name),
            None => Response::text(Status::NotFound, UNKNOWN_ROUTE),
        },
        "GET" if request.target == "/announcements.json" => list_announcements(ctx),
        "POST" => match stream_target(&request.path) {
            Some((event_id, talk)) => {
                let (event_id, talk) = (event_id.to_string(), talk.to_string());
                let test_only = request.query_param("testOnly") == Some("true");
                stream(ctx, &event_id, &talk, test_only, &mut request.body).await
            }
            None => Response::text(Status::NotFound, UNKNOWN_ROUTE),
        },
        _ => Response::text(Status::NotFound, UNKNOWN_ROUTE),
    }
}

fn create_event(ctx: &Context, name: &str) -> Response {
    match ctx.archive.create_event(name) {
        Ok(id) => Response::text(Status::Created, id),
        Err(e) => {
            tracing::error!("{}", e);
            Response::text(Status::for_error(&e), CREATE_FAILED)
        }
    }
}

fn list_announcements(ctx: &Context) -> Response {
    match ctx.archive.announcements_json() {
        Ok(json) => Response::json(json),
        Err(e) => {
            tracing::error!("{}", e);
            Response::text(Status::for_error(&e), LIST_FAILED)
        }
    }
}

async fn stream<R>(ctx: &Context, event_id: &str, talk: &str, test_only: bool, body: &mut R) -> Response
where
    R: AsyncBufRead + Unpin,
{
    let relay = ctx.relay(test_only);
    match relay.stream(&ctx.archive, event_id, talk, body).await {
        Ok(_) => Response::empty(Status::NoContent),
        Err(e) => {
            tracing::warn!("{}", e);
            Response::text(Status::NotFound, STREAM_FAILED)
        }
    }
}

/// Match `/<event>/<talk>` with two non-empty segments.
fn stream_target(path: &str) -> Option<(&str, &str)> {
    let (event_id, talk) = path.strip_prefix('/')?.split_once('/')?;
    if event_id.is_empty() || talk.is_empty() || talk.contains('/') {
        return None;
    }
    Some((event_id, talk))
}

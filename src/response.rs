//! Response formatting. Every response closes the connection.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use lectern_core::LecternError;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Created,
    NoContent,
    NotFound,
    InternalServerError,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "200 OK",
            Status::Created => "201 Created",
            Status::NoContent => "204 No Content",
            Status::NotFound => "404 File Not Found",
            Status::InternalServerError => "500 Internal Server Error",
        }
    }

    /// Status a route answers with when it fails with `err`.
    pub fn for_error(err: &LecternError) -> Self {
        match err {
            LecternError::NotFound(_) | LecternError::Relay(_) => Status::NotFound,
            _ => Status::InternalServerError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    pub fn text(status: Status, body: impl Into<String>) -> Self {
        Response {
            status,
            content_type: TEXT_PLAIN,
            body: body.into(),
        }
    }

    pub fn json(body: impl Into<String>) -> Self {
        Response {
            status: Status::Ok,
            content_type: APPLICATION_JSON,
            body: body.into(),
        }
    }

    pub fn empty(status: Status) -> Self {
        Self::text(status, "")
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "HTTP/1.0 {}\r\nContent-Type: {}\r\nConnection: close\r\n\r\n{}",
            self.status.as_str(),
            self.content_type,
            self.body
        )
        .into_bytes()
    }

    pub async fn write_to<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        writer.write_all(&self.to_bytes()).await?;
        writer.flush().await
    }
}

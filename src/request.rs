//! Minimal request parsing.
//!
//! Only the request line, the header block and the query string are parsed.
//! The body is left in the reader so uploads can be streamed without
//! buffering them.

use std::collections::HashMap;
use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// One parsed request. `body` is the rest of the connection's input.
pub struct Request<R> {
    pub method: String,
    pub target: String,
    pub path: String,
    pub query: HashMap<String, String>,
    /// Lower-cased, trimmed names and values.
    pub headers: HashMap<String, String>,
    pub body: R,
}

impl<R> Request<R> {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn is_chunked(&self) -> bool {
        self.header("transfer-encoding") == Some("chunked")
    }
}

/// Read the request line and headers from `reader`.
///
/// Returns `None` if the first line is blank or the input is already at its
/// end. Header lines without a colon are skipped. End of input inside the
/// header block ends the headers.
pub async fn read_request<R>(mut reader: R) -> io::Result<Option<Request<R>>>
where
    R: AsyncBufRead + Unpin,
{
    let Some(request_line) = read_line(&mut reader).await? else {
        return Ok(None);
    };
    if request_line.trim().is_empty() {
        return Ok(None);
    }

    let mut tokens = request_line.split_whitespace();
    let method = tokens.next().unwrap_or_default().to_string();
    let target = tokens.next().unwrap_or_default().to_string();

    let mut headers = HashMap::new();
    while let Some(line) = read_line(&mut reader).await? {
        if line.trim().is_empty() {
            break;
        }
        match line.split_once(':') {
            Some((name, value)) => {
                headers.insert(name.trim().to_lowercase(), value.trim().to_lowercase());
            }
            None => tracing::debug!("Skipping malformed header line {:?}", line.trim_end()),
        }
    }

    let (path, query) = split_target(&target);
    Ok(Some(Request {
        method,
        path: path.to_string(),
        query: parse_query(query),
        target,
        headers,
        body: reader,
    }))
}

async fn read_line<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Split a request target into path and query string, dropping any fragment.
fn split_target(target: &str) -> (&str, &str) {
    let target = target.split_once('#').map_or(target, |(before, _)| before);
    target.split_once('?').unwrap_or((target, ""))
}

/// Decode a query string. The last value wins for repeated keys.
fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_read_request_line_and_headers() {
        let input: &[u8] =
            b"POST /2024-06-01-test/lecture.mp4?testOnly=true HTTP/1.1\r\nHost: Example.ORG \r\nContent-Type: Video/MP4\r\n\r\nBODY";

        let mut request = read_request(input).await.unwrap().unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.target, "/2024-06-01-test/lecture.mp4?testOnly=true");
        assert_eq!(request.path, "/2024-06-01-test/lecture.mp4");
        assert_eq!(request.query_param("testOnly"), Some("true"));
        assert_eq!(request.header("host"), Some("example.org"));
        assert_eq!(request.header("content-type"), Some("video/mp4"));

        let mut body = String::new();
        request.body.read_to_string(&mut body).await.unwrap();
        assert_eq!(body, "BODY");
    }

    #[tokio::test]
    async fn test_blank_first_line_is_no_request() {
        assert!(read_request(&b"\r\n"[..]).await.unwrap().is_none());
        assert!(read_request(&b"   \n"[..]).await.unwrap().is_none());
        assert!(read_request(&b""[..]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_headers_end_at_eof() {
        let request = read_request(&b"GET /announcements.json HTTP/1.0\nAccept: */*"[..])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(request.header("accept"), Some("*/*"));
    }

    #[tokio::test]
    async fn test_header_without_colon_is_skipped() {
        let request = read_request(&b"GET / HTTP/1.0\nbogus line\nX-Ok: yes\n\n"[..])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("x-ok"), Some("yes"));
    }

    #[tokio::test]
    async fn test_chunked_detection() {
        let request = read_request(&b"POST /a/b HTTP/1.1\nTransfer-Encoding: Chunked\n\n"[..])
            .await
            .unwrap()
            .unwrap();
        assert!(request.is_chunked());
    }

    #[test]
    fn test_query_last_value_wins_and_decodes() {
        let query = parse_query("name=Rust+Meetup&x=1&x=2&city=K%C3%B6ln");
        assert_eq!(query.get("name").map(String::as_str), Some("Rust Meetup"));
        assert_eq!(query.get("x").map(String::as_str), Some("2"));
        assert_eq!(query.get("city").map(String::as_str), Some("Köln"));
    }

    #[test]
    fn test_split_target() {
        assert_eq!(split_target("/events/new?name=x"), ("/events/new", "name=x"));
        assert_eq!(split_target("/a/b#frag"), ("/a/b", ""));
        assert_eq!(split_target("/a?b=1#frag"), ("/a", "b=1"));
    }
}

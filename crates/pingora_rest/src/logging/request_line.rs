use std::fmt;

use http::Method;

/// One log line per request:
/// `[<remote-addr>] <verb> <path>[?<query>] <status>, <outcome>`
#[derive(Debug, Clone)]
pub struct RequestLine<'a> {
    pub remote_addr: Option<&'a str>,
    pub method: &'a Method,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub status: u16,
    pub outcome: &'a str,
}

impl fmt::Display for RequestLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}",
            self.remote_addr.unwrap_or("-"),
            self.method,
            self.path
        )?;
        if let Some(query) = self.query.filter(|q| !q.is_empty()) {
            write!(f, "?{query}")?;
        }
        write!(f, " {}, {}", self.status, self.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_and_without_remote_and_query() {
        let line = RequestLine {
            remote_addr: Some("127.0.0.1:5000"),
            method: &Method::GET,
            path: "/items",
            query: Some("page=2"),
            status: 200,
            outcome: "OK",
        };
        assert_eq!(line.to_string(), "[127.0.0.1:5000] GET /items?page=2 200, OK");

        let line = RequestLine {
            remote_addr: None,
            method: &Method::POST,
            path: "/items",
            query: None,
            status: 405,
            outcome: "method POST not supported by this resource",
        };
        assert_eq!(
            line.to_string(),
            "[-] POST /items 405, method POST not supported by this resource"
        );
    }
}

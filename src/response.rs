use std::collections::HashMap;

const TEXT_TYPE: &str = "text/plain";

/// A response as constructed by a handler and serialized by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16) -> Response {
        Response {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn ok(body: impl Into<Vec<u8>>) -> Response {
        Response::new(200).with_body(body)
    }

    pub fn not_found() -> Response {
        Response::new(404)
    }

    pub fn method_not_allowed(allow: &str) -> Response {
        Response::new(405).with_header("Allow", allow)
    }

    pub fn internal_error() -> Response {
        Response::new(500).with_body("Internal Server Error")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Response {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Response {
        self.body = body.into();
        self
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "",
    }
}

impl From<Response> for Vec<u8> {
    fn from(value: Response) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {status} {reason}\r\n",
            status = value.status,
            reason = reason_phrase(value.status)
        );
        for (name, header_value) in &value.headers {
            head.push_str(&format!("{name}: {header_value}\r\n"));
        }
        if !value.body.is_empty() && !value.headers.contains_key("Content-Type") {
            head.push_str(&format!("Content-Type: {TEXT_TYPE}\r\n"));
        }
        head.push_str(&format!("Content-Length: {len}\r\n\r\n", len = value.body.len()));

        let mut output = head.into_bytes();
        output.extend(value.body);
        output
    }
}

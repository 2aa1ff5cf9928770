use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use std::sync::Arc;

use anyhow::Result;
use tracing::error;

use crate::request::{Method, Request};
use crate::response::Response;
use crate::router::{Router, RouterBuilder};
use crate::threadpool;

/// Port the server listens on when nothing else is configured.
pub const DEFAULT_PORT: u16 = 18080;

pub struct Server {
    tcp_listener: TcpListener,
    pool: threadpool::ThreadPool,
    router: Arc<Router>,
}

pub struct ServerBuilder {
    router: RouterBuilder,
}

impl ServerBuilder {
    /// Binds the listener, builds the worker pool, and seals the route
    /// table. After this no further registrations are possible, which is
    /// what makes the unsynchronized concurrent dispatch in `run` sound.
    pub fn finalize(self, addr: impl ToSocketAddrs, pool_size: usize) -> Result<Server> {
        let socket_addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| anyhow::anyhow!("Could not resolve address"))?;

        let tcp_listener = TcpListener::bind(socket_addr)?;
        let pool = threadpool::ThreadPool::build(pool_size)?;

        let server = Server {
            tcp_listener,
            pool,
            router: Arc::new(self.router.seal()),
        };

        Ok(server)
    }

    /// Registers a handler for `method` and `pattern`. Fails on a malformed
    /// pattern or a duplicate `(method, pattern)` registration; both are
    /// fatal at startup.
    pub fn register_handler(
        mut self,
        method: Method,
        pattern: &str,
        handler: impl Fn(Request) -> anyhow::Result<Response> + 'static + Send + Sync,
    ) -> Result<Self> {
        self.router = self.router.register(method, pattern, handler)?;
        Ok(self)
    }
}

impl Server {
    pub fn build() -> ServerBuilder {
        ServerBuilder {
            router: RouterBuilder::new(),
        }
    }

    /// Address the listener actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.tcp_listener.local_addr()?)
    }

    pub fn run(&self) -> Result<()> {
        for stream in self.tcp_listener.incoming() {
            let mut stream = stream?;
            let router = self.router.clone();

            self.pool.execute(move || {
                if let Err(e) = handle_connection(&router, &mut stream) {
                    // Error boundary for the thread handling the connection
                    error!("Error handling connection: {e:?}");
                    _ = stream.write_all("HTTP/1.1 500 Internal Server Error\r\n\r\n".as_bytes());
                }
            });
        }
        Ok(())
    }
}

fn handle_connection<S>(router: &Router, stream: &mut S) -> Result<()>
where
    S: Read + Write,
{
    let request = read_and_parse_request(stream)
        .map_err(|e| anyhow::anyhow!("Error parsing request: {e:?}"))?;

    let response = router.dispatch(request);

    // write response into TcpStream
    stream.write_all(&Vec::<u8>::from(response))?;

    Ok(())
}

fn read_and_parse_request(stream: &mut impl Read) -> Result<Request> {
    // create buffer
    let mut buffer = BufReader::new(stream);

    // Read the HTTP request head until the blank line
    let lines = {
        let mut lines: Vec<String> = vec![];
        loop {
            let mut next_line = String::new();
            buffer.read_line(&mut next_line)?;
            if next_line.is_empty() || next_line == "\r" || next_line == "\r\n" {
                break lines;
            }
            lines.push(next_line);
        }
    };

    let mut request = parse_request_head(&lines)?;

    // Read the body according to Content-Length
    let content_length = request
        .headers
        .get("content-length")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(0);
    if content_length > 0 {
        let mut body = vec![0u8; content_length];
        buffer.read_exact(&mut body)?;
        request.body = body;
    }

    Ok(request)
}

fn parse_request_head(lines: &[String]) -> Result<Request> {
    let request_line = lines
        .first()
        .ok_or_else(|| anyhow::anyhow!("Empty request"))?;
    let mut request = Request::parse(request_line)?;

    for line in &lines[1..] {
        if let Some((name, value)) = line.split_once(':') {
            request
                .headers
                .insert(name.trim().to_ascii_lowercase(), value.trim().to_owned());
        }
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    // in-memory stand-in for a TcpStream
    struct FakeStream {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl FakeStream {
        fn new(input: &str) -> FakeStream {
            FakeStream {
                input: Cursor::new(input.as_bytes().to_vec()),
                output: Vec::new(),
            }
        }

        fn response_text(&self) -> String {
            String::from_utf8_lossy(&self.output).into_owned()
        }
    }

    impl Read for FakeStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for FakeStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn test_router() -> Router {
        RouterBuilder::new()
            .register(Method::Get, "/api", |_req| Ok(Response::ok("Hello world")))
            .unwrap()
            .register(Method::Post, "/echo", |req| Ok(Response::ok(req.body)))
            .unwrap()
            .seal()
    }

    #[test]
    fn test_builder_pattern() {
        let _server = Server::build()
            .register_handler(Method::Get, "/", |_req| {
                Ok(Response::ok("Hello, Arete-Web!"))
            })
            .unwrap()
            .finalize(("127.0.0.1", 0), 4)
            .unwrap();
    }

    #[test]
    fn test_duplicate_registration_fails_at_startup() {
        let builder = Server::build()
            .register_handler(Method::Get, "/api", |_req| Ok(Response::ok("a")))
            .unwrap();
        let result = builder.register_handler(Method::Get, "/api", |_req| Ok(Response::ok("b")));
        assert!(result.is_err());
    }

    #[test]
    fn test_connection_round_trip() {
        let router = test_router();
        let mut stream = FakeStream::new("GET /api HTTP/1.1\r\nHost: localhost\r\n\r\n");

        handle_connection(&router, &mut stream).unwrap();

        let text = stream.response_text();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("\r\n\r\nHello world"));
    }

    #[test]
    fn test_body_read_by_content_length() {
        let router = test_router();
        let mut stream =
            FakeStream::new("POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello");

        handle_connection(&router, &mut stream).unwrap();

        assert!(stream.response_text().ends_with("hello"));
    }

    #[test]
    fn test_unknown_path_yields_404() {
        let router = test_router();
        let mut stream = FakeStream::new("GET /nope HTTP/1.1\r\n\r\n");

        handle_connection(&router, &mut stream).unwrap();

        assert!(stream.response_text().starts_with("HTTP/1.1 404 Not Found\r\n"));
    }

    #[test]
    fn test_malformed_request_line_is_an_error() {
        let router = test_router();
        let mut stream = FakeStream::new("GET /api HTTP/1.0\r\n\r\n");

        let result = handle_connection(&router, &mut stream);
        assert!(result.is_err());
    }

    #[test]
    fn test_header_names_lowercased() {
        let lines = vec![
            "GET /api HTTP/1.1".to_owned(),
            "X-Custom-Header: value\r\n".to_owned(),
        ];
        let request = parse_request_head(&lines).unwrap();
        assert_eq!(
            request.headers.get("x-custom-header").map(String::as_str),
            Some("value")
        );
    }
}

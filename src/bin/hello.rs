use anyhow::Result;
use arete_web::request::Method;
use arete_web::response::Response;
use arete_web::server::{Server, DEFAULT_PORT};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let server = Server::build()
        .register_handler(Method::Get, "/api", |_req| Ok(Response::ok("Hello world")))?
        .finalize(("0.0.0.0", port), 4)?;

    server.run()
}

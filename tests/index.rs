use std::thread;

use anyhow::Result;
use arete_web::{request::Method, response::Response, server::Server};

#[tokio::test]
async fn test_index() -> Result<()> {
    let server = Server::build()
        .register_handler(Method::Get, "/api", |_req| Ok(Response::ok("Hello world")))?
        .register_handler(Method::Get, "/users/:id", |req| {
            let id = req.param("id").unwrap_or("?").to_owned();
            Ok(Response::ok(format!("user {id}")))
        })?
        .register_handler(Method::Get, "/boom", |_req| {
            anyhow::bail!("handler blew up")
        })?
        .finalize(("127.0.0.1", 0), 4)?;

    let addr = server.local_addr()?;
    let _server_join = thread::spawn(move || {
        server.run().ok();
    });

    let base = format!("http://{addr}");
    let client = reqwest::Client::new();

    // plain literal route
    let r = reqwest::get(format!("{base}/api")).await?;
    assert_eq!(r.status().as_u16(), 200);
    assert_eq!(r.text().await?, "Hello world");

    // no route matches the path at all
    let r = reqwest::get(format!("{base}/anything")).await?;
    assert_eq!(r.status().as_u16(), 404);
    assert_eq!(r.text().await?, "");

    // path exists, method does not
    let r = client.post(format!("{base}/api")).send().await?;
    assert_eq!(r.status().as_u16(), 405);
    assert_eq!(r.headers().get("allow").unwrap(), "GET");

    // named segment capture
    let r = reqwest::get(format!("{base}/users/42")).await?;
    assert_eq!(r.status().as_u16(), 200);
    assert_eq!(r.text().await?, "user 42");

    let r = reqwest::get(format!("{base}/users/42/profile")).await?;
    assert_eq!(r.status().as_u16(), 404);

    // a failing handler is contained as a 500
    let r = reqwest::get(format!("{base}/boom")).await?;
    assert_eq!(r.status().as_u16(), 500);
    assert_eq!(r.text().await?, "Internal Server Error");

    // and the server keeps serving afterwards
    let r = reqwest::get(format!("{base}/api")).await?;
    assert_eq!(r.status().as_u16(), 200);

    Ok(())
}

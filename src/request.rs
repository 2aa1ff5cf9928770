use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method = match s {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            _ => anyhow::bail!("Invalid method {s}"),
        };
        Ok(method)
    }
}

/// A parsed request, owned by the dispatch call that received it.
///
/// Header names are stored lowercased. `params` holds the values captured by
/// named pattern segments and is filled in by the router just before the
/// handler runs.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    params: HashMap<String, String>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Request {
        Request {
            method,
            path: path.into(),
            headers: HashMap::new(),
            body: Vec::new(),
            params: HashMap::new(),
        }
    }

    // should this be a From implementation instead?
    pub fn parse(request_line: impl AsRef<str>) -> anyhow::Result<Request> {
        let request_line = request_line.as_ref();
        let mut parts = request_line.split_whitespace();

        let method = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("No method found"))?;
        let uri = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("No URI found"))?;
        let protocol = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("No protocol found"))?;

        if protocol != "HTTP/1.1" {
            anyhow::bail!("Server can only work with HTTP/1.1");
        }

        // should have no more parts left
        if parts.next().is_some() {
            anyhow::bail!("Invalid request line: extra values after parts");
        }

        Ok(Request::new(method.parse::<Method>()?, uri))
    }

    /// Value captured for a named pattern segment, e.g. `id` for `/users/:id`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }
}

use crate::request::Request;
use crate::response;

pub trait HandlerTrait {
    fn handle(&self, request: Request) -> anyhow::Result<response::Response>;
}

impl<F> HandlerTrait for F
where
    F: Fn(Request) -> anyhow::Result<response::Response>,
{
    fn handle(&self, request: Request) -> anyhow::Result<response::Response> {
        self(request)
    }
}

pub type Handler = Box<dyn HandlerTrait + Send + Sync + 'static>;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{EntryPoint, Form, Handler, Request, RequestContext, Response, Verb};
use crate::error::{DispatchError, WebError};

/// Per-route handler for one verb of one resource: parse the form, call the
/// entry point and encode its reply.
pub struct Dispatcher {
    verb: Verb,
    entry: Arc<dyn EntryPoint>,
}

impl Dispatcher {
    pub fn new(verb: Verb, entry: Arc<dyn EntryPoint>) -> Self {
        Self { verb, entry }
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn dispatch(&self, req: Request) -> Result<Response, DispatchError> {
        let form = Form::parse(&req)?;
        let ctx = RequestContext::new(req, form);
        let reply = self.entry.call(&ctx);
        reply.into_response()
    }
}

#[async_trait]
impl Handler for Dispatcher {
    async fn handle(&self, req: Request) -> Result<Response, WebError> {
        Ok(self.dispatch(req)?)
    }
}

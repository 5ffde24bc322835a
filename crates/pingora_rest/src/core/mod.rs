pub mod dispatch;
pub mod form;
pub mod reply;
pub mod request;
pub mod resource;
pub mod response;
pub mod router;

pub use dispatch::Dispatcher;
pub use form::{Form, FormParseError};
pub use http::Method; // Use standard HTTP Method
pub use reply::Reply;
pub use request::Request;
pub use resource::{EntryPoint, RequestContext, Resource, Verb};
pub use response::Response;
pub use router::{ExactRouter, Handler, ParamRouter, PathRouter, PatternRouter, RouteError};

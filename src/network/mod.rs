pub mod client;
pub mod transport;

pub use client::ApiClient;
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};

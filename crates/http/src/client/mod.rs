//! Client role: a persistent connection to one server plus redirect following.

mod config;
mod http_client;
mod redirect;

pub use config::ClientConfig;
pub use config::DEFAULT_MAX_REDIRECTS;
pub use http_client::HttpClient;
pub use redirect::RedirectResolver;
pub use redirect::RedirectTarget;
pub use redirect::redirect_target;

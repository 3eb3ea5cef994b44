pub mod auth;
pub mod client;
pub mod envelope;
pub mod transport;

pub use auth::AuthApi;
pub use client::{ApiClient, Attempt, PendingRequest};
pub use envelope::Envelope;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport, TransportError};

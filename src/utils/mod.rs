pub mod base64;
pub mod http;
pub mod retry;
pub mod url;

// Re-export common utilities
pub use http::{ApiRequest, HttpError, HttpResponse, HttpTransport, ReqwestTransport};
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};
pub use url::{url_decode, url_encode};

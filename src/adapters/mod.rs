pub mod http;
pub mod memory;

pub use http::HttpTransport;
pub use memory::InMemoryApplications;

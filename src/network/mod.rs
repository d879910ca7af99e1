pub mod client;
pub mod errors;

pub use client::JsonClient;
pub use errors::NetworkError;

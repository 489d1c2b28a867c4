pub mod client;
pub mod line_buffer;
pub mod logging;
#[cfg(test)]
pub mod mock_client;
pub mod payload;
pub mod stream;

pub use client::{ApiClient, ByteStream};

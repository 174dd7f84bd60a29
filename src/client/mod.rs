//! The client façade (spec §4.8): connection lifecycle, retry policy, idle
//! timeout, reconnection backoff, and cancellation, layered on the ADU
//! framers and the transaction engine.

mod backoff;
mod datagram_client;
mod retry;
mod serial_client;
mod state;
mod stream_client;
mod transaction_id;
mod validate;

pub use backoff::ReconnectBackoff;
pub use datagram_client::DatagramClient;
pub use serial_client::SerialClient;
pub use state::ConnectionState;
pub use stream_client::StreamClient;
pub use transaction_id::TransactionIdGenerator;

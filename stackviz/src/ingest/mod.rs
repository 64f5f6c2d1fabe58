//! Sample ingestion
//!
//! - `decoder`: fixed-layout datagram decoding
//! - `receiver`: dedicated thread owning the UDP socket

pub mod decoder;
pub mod receiver;

pub use decoder::decode_sample;
pub use receiver::{ReceiverStats, SampleReceiver, DEFAULT_BIND_ADDR, RECV_BUFFER_SIZE};

//! The transaction engine (spec §4.5-§4.7): incremental frame decoding and
//! response demultiplexing for stream transports, and the exclusive-access
//! request/response primitive for serial transports.

pub mod demux;
pub mod serial;
pub mod stream_decoder;

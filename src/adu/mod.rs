//! Application Data Unit framing: MBAP (TCP/TLS/UDP), RTU and ASCII (serial).

pub mod ascii;
pub mod mbap;
pub mod rtu;

//! Built-in format decoders.

pub mod raw;
pub mod some_ip_sd;

pub use raw::RawFormat;
pub use some_ip_sd::SomeIpSdFormat;

//! Problem types built on the containers

pub mod lcp;

pub use lcp::Lcp;

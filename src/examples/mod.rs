//! Demonstration grammars built with the library.

pub mod ip_pool;

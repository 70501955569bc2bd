//! Sanity check for a multilingual text-embedding endpoint.

mod check;
mod client;

pub use check::*;
pub use client::*;

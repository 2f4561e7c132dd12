//! Fragmentation and reassembly layer for RSocket transports.
//!
//! Sits as a transparent decorator between an RSocket protocol engine and a
//! raw byte-frame duplex connection. Outbound, it splits any oversized,
//! fragmentable frame into a sequence of wire fragments no larger than a
//! configured MTU ([`fragment`]). Inbound, it buffers fragments belonging to
//! one logical frame and emits the reassembled whole ([`reassemble`]).
//! [`adapter::FragmentingDuplexAdapter`] is the entry point most callers
//! want; [`frame`] and [`codec`] are exposed for callers that need to work
//! with wire fragments directly.

pub mod adapter;
pub mod codec;
pub mod config;
pub mod duplex;
pub mod error;
pub mod fragment;
pub mod frame;
pub mod reassemble;

#[cfg(test)]
mod tests;

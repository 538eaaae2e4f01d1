//! Protocol encoding and decoding modules.
//!
//! Each protocol follows a layered structure:
//! - `layout`: byte offsets, alignment rules and precomputed blocks (source of truth)
//! - `reader`: safe byte access over received datagrams
//! - `parser`: domain-level decoding (no direct byte indexing)
//! - `encoder`: packet construction over preallocated buffers
//! - `error`: explicit, actionable errors
//!
//! Parsers and encoders are pure and contain no I/O; transports and the
//! relay layer handle sockets and sequencing.

pub mod osc;

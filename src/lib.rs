#![deny(missing_docs)]
//! A multithreaded, persistent, binary-safe key-value store (bytekv) that
//! maps byte-sequence keys to byte-sequence values over a text-framed line
//! protocol.
//!
//! This crate provides the storage engine itself, as well as a
//! `bytekv-client` and `bytekv-server` executable that speak the wire
//! protocol over synchronous TCP.
//!
//! ## Supported Storage Operations
//! The engine supports five storage operations plus two session verbs:
//!
//! - `SET key value` stores a value under a key (`+OK`)
//! - `GET key` fetches the value for a key (`$<value>`, or `$-1` if absent)
//! - `DEL key` removes a key and compacts it out of the on-disk log (`+OK`)
//! - `EXISTS key` checks presence (`:1` / `:0`)
//! - `RENAME old new` moves a value to a new key without copying it (`+OK`)
//! - `PING` checks liveness (`+PONG`)
//! - `QUIT` acknowledges with `+OK` and closes the connection
//!
//! See the [`KvEngine`] trait and the [`Request`] and [`Reply`] types for
//! the exact shapes of these operations.
//!
//! ## Store
//! [`Store`] is the implementor of the [`KvEngine`] trait and the brains of
//! this entire operation. It is responsible for:
//! - maintaining the data in a fixed-bucket-count, chained [`HashIndex`]
//! - serializing mutations (and letting lookups overlap) behind one
//!   process-wide reader-writer lock
//! - persisting every accepted mutation into an append-only [`CommandLog`]
//! - replaying that log at start-up to rebuild the in-memory index
//! - compacting deleted keys out of the log on `DEL`
//!
//! ## Wire protocol
//! Each request is one line: a verb plus space-separated arguments,
//! terminated by a line break. Each reply is one CRLF-terminated line whose
//! first byte gives its kind: `+` status, `$` bulk value (`$-1` for null),
//! `:` integer, `-` error. Keys and values are raw bytes, not text; the
//! only bytes the protocol claims for itself are the space separators and
//! the line terminator.
//!
//! ## Client / Server
//! [`KvClient`] and [`KvServer`] handle the networking. The server runs one
//! worker per connection on a pluggable [`ThreadPool`]; workers share the
//! engine handle and nothing else.

pub use buffer::Buffer;
pub use client::KvClient;
pub use command::{dispatch, Reply, Request};
pub use engine::{KvEngine, Store};
pub use error::{KvError, Result};
pub use index::HashIndex;
pub use log::{CommandLog, MAX_PAYLOAD_LEN};
pub use server::KvServer;
pub use thread_pool::{NaiveThreadPool, RayonThreadPool, SharedQueueThreadPool, ThreadPool};

mod buffer;
mod client;
mod command;
mod engine;
mod error;
mod index;
mod log;
mod server;
pub mod thread_pool;

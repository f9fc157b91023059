//! HTTP protocol implementation.
//!
//! This module implements the HTTP/1.1 request lifecycle: incremental
//! parsing, request assembly, response serialization, and the per-connection
//! state machine that ties them together.
//!
//! # Architecture
//!
//! - **`connection`**: the per-socket lifecycle state machine
//! - **`parser`**: incremental, callback-driven request parser
//! - **`request`**: the frozen request record and the assembler that builds it
//! - **`response`**: the response record, builder, and reason-phrase table
//! - **`headers`**: ordered, case-preserving, multi-valued header map
//! - **`writer`**: serialization and transmission, including file streaming
//!
//! # Connection lifecycle
//!
//! ```text
//!        ┌────────────┐
//!        │    OPEN    │ ← read and parse incoming bytes
//!        └─────┬──────┘
//!              │ message complete (request frozen)
//!              ▼
//!        ┌────────────┐
//!        │ DISPATCHING│ ← handler invoked exactly once
//!        └─────┬──────┘
//!              ▼
//!        ┌────────────┐
//!        │ RESPONDING │ ← response fully flushed
//!        └─────┬──────┘
//!              ├─ keep-alive → OPEN (pipelined bytes first)
//!              └─ close → CLOSING → CLOSED
//! ```

pub mod connection;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

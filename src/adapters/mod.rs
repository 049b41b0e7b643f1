//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the core to external systems:
//! - `ai` - Chat and embedding endpoints, plus offline stand-ins
//! - `retrieval` - Reference document search
//! - `storage` - Session persistence (Redis, in-memory)
//! - `http` - The turn API

pub mod ai;
pub mod http;
pub mod retrieval;
pub mod storage;

//! MCP protocol surface.
//!
//! Advertises the tool catalog and forwards tool calls to the dispatcher.

pub mod service;

pub use service::DbService;

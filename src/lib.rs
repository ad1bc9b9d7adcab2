//! MCP server for Figma design retrieval.
//!
//! Exposes `get_screenshot`, `get_design_context`, `get_metadata`,
//! `get_variable_defs`, `get_figjam`, `get_code_connect_map`,
//! `create_design_system_rules` and `whoami` over JSON-RPC 2.0 stdio
//! transport. Every call to the Figma REST API goes through a bounded
//! retry policy that absorbs rate limiting and transient server errors.

pub mod config;
pub mod error;
pub mod figma_url;
pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod retry;
pub mod server;
pub mod upstream;

pub mod schema;

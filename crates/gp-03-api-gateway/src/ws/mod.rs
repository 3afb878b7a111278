//! WebSocket module: per-group connection hub.
//!
//! - `get`, `send_coordinates`, `update_role`, `kick` actions
//! - Mutations fan out to every connection of the group
//! - Message size limits

pub mod frames;
pub mod handler;
pub mod hub;

pub use frames::{parse_action, Action, FrameError, OutboundFrame};
pub use handler::WebSocketHandler;
pub use hub::{Connection, FrameSink, Hub};

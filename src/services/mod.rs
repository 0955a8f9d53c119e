//! Services - guidance and planning logic
//!
//! - `navigator` - Central owner of guidance state and the event loop
//! - `snapshot_builder` - Validates raw engine ticks into snapshots
//! - `planning` - Route planning session state machine
//! - `panel_state` - Versioned save/restore of the planning panel
//! - `engine` - Outbound request interface to the routing engine

pub mod engine;
pub mod navigator;
pub mod panel_state;
pub mod planning;
pub mod snapshot_builder;

// Re-export commonly used types
pub use engine::{Endpoint, EngineRequest, RouteEngine};
pub use navigator::{CommandOutcome, EngineEvent, NavEvent, Navigator, SnapshotReceiver, UiCommand};
pub use planning::{CommittedRoute, PlanningSessionController, ProgressUpdate, SessionError};
pub use snapshot_builder::{RawLane, RawTick, SnapshotBuilder, TickError};

//! Edit history of one warp: commits, undo/redo and undo-all.

pub mod controller;
pub mod controls;
pub mod error;

pub use controller::{DrawStroke, EditCompleted, EditHistory, RefreshOutcome};
pub use controls::HistoryControls;
pub use error::{HistoryError, HistoryOperation, HistoryResult};

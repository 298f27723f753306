use crate::session::{LastOperation, SessionParameters};

/// Enablement of the history buttons, recomputed from state on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryControls {
    pub undo: bool,
    pub redo: bool,
    pub undo_all: bool,
}

impl HistoryControls {
    pub fn project(layer_count: usize, params: &SessionParameters) -> Self {
        let has_edits = layer_count > 1;
        let pending_redo = params.has_pending_redo();
        let after_undo_all = params
            .last_operation()
            .is_ok_and(|operation| operation == LastOperation::UndoAll);

        Self {
            undo: has_edits && !pending_redo && !after_undo_all,
            redo: pending_redo,
            undo_all: has_edits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::LayerId;

    #[test]
    fn base_only_disables_everything() {
        let params = SessionParameters::new();
        assert_eq!(HistoryControls::project(1, &params), HistoryControls::default());
    }

    #[test]
    fn pending_redo_blocks_undo_but_not_undo_all() {
        let mut params = SessionParameters::new();
        params.set_redo_transform_id(Some(LayerId::new(3)));

        let controls = HistoryControls::project(2, &params);
        assert!(!controls.undo);
        assert!(controls.redo);
        assert!(controls.undo_all);
    }

    #[test]
    fn undo_stays_disabled_after_undo_all() {
        let mut params = SessionParameters::new();
        params.set_last_operation(LastOperation::UndoAll);

        let controls = HistoryControls::project(3, &params);
        assert!(!controls.undo);
        assert!(controls.undo_all);

        params.set_last_operation(LastOperation::Smooth);
        assert!(HistoryControls::project(3, &params).undo);
    }
}

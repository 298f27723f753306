//! Property-based tests for the edit history over arbitrary operation sequences.
//!
//! After every step:
//!
//! 1. The session mirror agrees with the redo slot and the ledger
//! 2. No active drawing points at a layer that is neither live nor pending redo
//! 3. Each transition obeys its layer-count and redo-slot law

use proptest::prelude::*;
use warpdrive::annotation::HierarchyParent;
use warpdrive::geometry::{GridDefinition, GridPoint};
use warpdrive::history::{DrawStroke, EditHistory, HistoryError, HistoryOperation};
use warpdrive::session::EditTool;
use warpdrive::transform::DisplacementGrid;
use warpdrive::SessionParameters;

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Commit(EditTool, usize),
    Undo,
    Redo,
    UndoAll,
    Exit,
    Detach(usize),
}

fn tool_strategy() -> impl Strategy<Value = EditTool> {
    prop_oneof![
        Just(EditTool::Smudge),
        Just(EditTool::Draw),
        Just(EditTool::Smooth),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (tool_strategy(), 1usize..4).prop_map(|(tool, points)| Op::Commit(tool, points)),
        3 => Just(Op::Undo),
        2 => Just(Op::Redo),
        1 => Just(Op::UndoAll),
        1 => Just(Op::Exit),
        1 => (0usize..8).prop_map(Op::Detach),
    ]
}

fn grid() -> GridDefinition {
    GridDefinition::isotropic(GridPoint::new(0.0, 0.0, 0.0), 1.0, [2, 2, 2])
}

fn history() -> EditHistory<DisplacementGrid> {
    EditHistory::new(
        "GridTransform1",
        DisplacementGrid::identity(grid()),
        SessionParameters::new(),
    )
}

fn stroke(points: usize) -> DrawStroke {
    DrawStroke {
        parent: HierarchyParent::Folder(1),
        control_points: (0..points)
            .map(|n| GridPoint::new(n as f64, 0.0, 0.0))
            .collect(),
    }
}

fn assert_drawings_follow_layers(
    history: &EditHistory<DisplacementGrid>,
) -> Result<(), TestCaseError> {
    let pending = history.pending_redo().map(|layer| layer.id());
    for annotation in history.annotations().iter().filter(|a| a.is_active()) {
        let layer = annotation.layer();
        prop_assert!(
            history.warp().layer(layer).is_some() || pending == Some(layer),
            "active drawing {} points at vanished layer {}",
            annotation.id(),
            layer
        );
    }
    Ok(())
}

fn step(history: &mut EditHistory<DisplacementGrid>, op: &Op) -> Result<(), TestCaseError> {
    let count = history.layer_count();
    let top = history.warp().top_layer_id();
    let had_redo = history.pending_redo().is_some();

    let outcome = match op {
        Op::Commit(tool, points) => {
            let stroke = (*tool == EditTool::Draw).then(|| stroke(*points));
            let deformation = DisplacementGrid::uniform(grid(), [0.25, 0.0, 0.0]);
            history.commit(*tool, deformation, stroke).map(|layer| {
                assert_eq!(history.layer_count(), count + 1);
                assert_eq!(history.warp().top_layer_id(), layer);
                assert!(history.pending_redo().is_none());
            })
        }
        Op::Undo => {
            let before = history.params().clone();
            match history.undo() {
                Ok(undone) => {
                    prop_assert_eq!(undone, top);
                    prop_assert_eq!(history.layer_count(), count - 1);
                    prop_assert_eq!(history.params().redo_transform_id().unwrap(), Some(undone));
                    Ok(())
                }
                Err(err) => {
                    prop_assert_eq!(count, 1);
                    prop_assert!(matches!(
                        err,
                        HistoryError::InvalidOperation {
                            operation: HistoryOperation::Undo,
                            ..
                        }
                    ), "unexpected error: {:?}", err);
                    prop_assert_eq!(history.layer_count(), 1);
                    prop_assert_eq!(history.params(), &before);
                    Ok(())
                }
            }
        }
        Op::Redo => match history.redo() {
            Ok(redone) => {
                prop_assert!(had_redo);
                prop_assert_eq!(history.layer_count(), count + 1);
                prop_assert_eq!(history.warp().top_layer_id(), redone);
                prop_assert!(history.pending_redo().is_none());
                Ok(())
            }
            Err(err) => {
                prop_assert!(!had_redo);
                prop_assert!(err.is_recoverable());
                prop_assert_eq!(history.layer_count(), count);
                Ok(())
            }
        },
        Op::UndoAll => history.undo_all().map(|()| {
            assert_eq!(history.layer_count(), 1);
            assert!(history.pending_redo().is_none());
            assert!(!history.params().has_pending_redo());
        }),
        Op::Exit => {
            history.exit();
            prop_assert!(history.pending_redo().is_none());
            prop_assert_eq!(history.layer_count(), count);
            Ok(())
        }
        Op::Detach(pick) => {
            let ids: Vec<_> = history.annotations().iter().map(|a| a.id()).collect();
            if ids.is_empty() {
                Ok(())
            } else {
                history.move_annotation(ids[pick % ids.len()], HierarchyParent::Detached)
            }
        }
    };

    if let Err(err) = outcome {
        prop_assert!(
            !matches!(err, HistoryError::Inconsistent { .. }),
            "{op:?} left the history inconsistent: {err}"
        );
    }
    prop_assert!(
        history.check_consistency().is_ok(),
        "after {:?}: {:?}",
        op,
        history.check_consistency()
    );
    assert_drawings_follow_layers(history)
}

proptest! {
    #[test]
    fn every_sequence_keeps_the_history_consistent(
        ops in prop::collection::vec(op_strategy(), 1..40)
    ) {
        let mut history = history();
        for op in &ops {
            step(&mut history, op)?;
        }
    }

    #[test]
    fn undo_then_redo_restores_count_and_top(
        tools in prop::collection::vec(tool_strategy(), 1..10)
    ) {
        let mut history = history();
        for tool in &tools {
            step(&mut history, &Op::Commit(*tool, 3))?;
        }
        let count = history.layer_count();
        let top = history.warp().top_layer_id();
        let active = history.annotations().active_count();

        history.undo().expect("undo after commit");
        history.redo().expect("redo after undo");

        prop_assert_eq!(history.layer_count(), count);
        prop_assert_eq!(history.warp().top_layer_id(), top);
        prop_assert_eq!(history.annotations().active_count(), active);
    }

    #[test]
    fn undo_all_reaches_base_without_losing_drawings(
        ops in prop::collection::vec(op_strategy(), 0..30)
    ) {
        let mut history = history();
        for op in &ops {
            step(&mut history, op)?;
        }
        let drawings = history.annotations().len();

        history.undo_all().expect("undo all");
        prop_assert_eq!(history.layer_count(), 1);
        prop_assert_eq!(history.annotations().len(), drawings);
        prop_assert_eq!(history.annotations().active_count(), 0);
        prop_assert!(!history.controls().redo);
    }
}

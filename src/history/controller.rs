use super::controls::HistoryControls;
use super::error::{HistoryError, HistoryOperation, HistoryResult};
use crate::annotation::{AnnotationId, AnnotationLedger, HierarchyParent};
use crate::geometry::GridPoint;
use crate::session::{keys, EditTool, LastOperation, SessionParameters};
use crate::transform::{Deformation, LayerId, LayeredTransform, TransformLayer};

const RESOLUTION_TOLERANCE: f64 = 1e-9;
const NO_EFFECT: &str = "None";

/// Marker set produced by a draw edit.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawStroke {
    pub parent: HierarchyParent,
    pub control_points: Vec<GridPoint>,
}

/// Report from an edit tool that finished an operation.
#[derive(Debug, Clone)]
pub struct EditCompleted<D> {
    pub tool: EditTool,
    pub deformation: D,
    pub stroke: Option<DrawStroke>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub controls: HistoryControls,
    /// Pending redo state was dropped because the session moved on.
    pub exited: bool,
}

/// Sole owner of a warp's layer stack, its draw annotations and the redo slot.
///
/// The session record mirrors the redo slot (`redoTransformID`) and the hidden
/// drawing awaiting redo (`lastDrawingID`). Every transition checks that the
/// mirror still matches before touching anything.
#[derive(Debug)]
pub struct EditHistory<D: Deformation> {
    warp: LayeredTransform<D>,
    annotations: AnnotationLedger,
    params: SessionParameters,
    redo_slot: Option<TransformLayer<D>>,
}

impl<D: Deformation> EditHistory<D> {
    pub fn new(warp_id: &str, base: D, mut params: SessionParameters) -> Self {
        params.set_warp_id(warp_id);
        params.set_redo_transform_id(None);
        params.set_last_drawing_id(None);
        params.set_last_operation(LastOperation::None);
        tracing::info!(warp_id, "edit history opened");
        Self {
            warp: LayeredTransform::new(base),
            annotations: AnnotationLedger::new(),
            params,
            redo_slot: None,
        }
    }

    pub fn warp(&self) -> &LayeredTransform<D> {
        &self.warp
    }

    pub fn annotations(&self) -> &AnnotationLedger {
        &self.annotations
    }

    pub fn params(&self) -> &SessionParameters {
        &self.params
    }

    /// Tool settings and bookkeeping may be edited freely; history fields are
    /// re-validated on the next transition.
    pub fn params_mut(&mut self) -> &mut SessionParameters {
        &mut self.params
    }

    pub fn layer_count(&self) -> usize {
        self.warp.layer_count()
    }

    pub fn pending_redo(&self) -> Option<&TransformLayer<D>> {
        self.redo_slot.as_ref()
    }

    pub fn controls(&self) -> HistoryControls {
        HistoryControls::project(self.warp.layer_count(), &self.params)
    }

    /// Verifies the session mirror against the redo slot and the ledger.
    pub fn check_consistency(&self) -> HistoryResult<()> {
        let mirrored = self.params.redo_transform_id()?;
        let held = self.redo_slot.as_ref().map(TransformLayer::id);
        if mirrored != held {
            return Err(HistoryError::inconsistent(format!(
                "redoTransformID is {mirrored:?} but the redo slot holds {held:?}"
            )));
        }
        if let Some(id) = held {
            if self.warp.layer(id).is_some() {
                return Err(HistoryError::inconsistent(format!(
                    "layer {id} is both live and pending redo"
                )));
            }
        }
        if let Some(drawing) = self.params.last_drawing_id()? {
            match self.annotations.get(drawing) {
                None => {
                    return Err(HistoryError::inconsistent(format!(
                        "lastDrawingID {drawing} is not in the ledger"
                    )))
                }
                Some(annotation) if annotation.is_active() => {
                    return Err(HistoryError::inconsistent(format!(
                        "lastDrawingID {drawing} is still active"
                    )))
                }
                Some(annotation) if Some(annotation.layer()) != held => {
                    return Err(HistoryError::inconsistent(format!(
                        "lastDrawingID {drawing} belongs to {} which is not pending redo",
                        annotation.layer()
                    )))
                }
                Some(_) => {}
            }
        }
        if let Some(orphan) = self.annotations.iter().find(|annotation| {
            annotation.is_active()
                && self.warp.layer(annotation.layer()).is_none()
                && Some(annotation.layer()) != held
        }) {
            return Err(HistoryError::inconsistent(format!(
                "active drawing {} points at vanished layer {}",
                orphan.id(),
                orphan.layer()
            )));
        }
        self.params.last_operation()?;
        Ok(())
    }

    fn ensure_consistent(&self, operation: HistoryOperation) -> HistoryResult<()> {
        self.check_consistency().inspect_err(|err| {
            tracing::error!(%operation, %err, "aborting history transition");
        })
    }

    pub fn on_edit_completed(&mut self, event: EditCompleted<D>) -> HistoryResult<LayerId> {
        self.commit(event.tool, event.deformation, event.stroke)
    }

    /// Appends the layer produced by a finished edit; a pending redo is lost.
    pub fn commit(
        &mut self,
        tool: EditTool,
        deformation: D,
        stroke: Option<DrawStroke>,
    ) -> HistoryResult<LayerId> {
        let operation = HistoryOperation::Commit;
        tracing::debug!(?tool, "commit requested");
        self.ensure_consistent(operation)?;

        if !self.warp.base().deformation().is_compatible(&deformation) {
            tracing::warn!(?tool, "rejecting edit sampled on a different grid");
            return Err(HistoryError::invalid(
                operation,
                "deformation does not match the warp grid",
            ));
        }
        let stroke = match (tool, stroke) {
            (EditTool::Draw, None) => {
                return Err(HistoryError::invalid(operation, "draw edit without a stroke"));
            }
            (EditTool::Draw, stroke) => stroke,
            (_, Some(_)) => {
                tracing::warn!(?tool, "ignoring stroke attached to a non-draw edit");
                None
            }
            (_, None) => None,
        };

        self.drop_redo_state(true);
        let layer = self.warp.append_layer(deformation);
        if let Some(stroke) = stroke {
            let annotation =
                self.annotations
                    .record_annotation(stroke.parent, layer, stroke.control_points);
            tracing::debug!(%annotation, %layer, "recorded drawing");
        }
        self.params.set_last_operation(tool.operation());
        self.params.set_bool(keys::WARP_MODIFIED, true);

        tracing::info!(
            ?tool,
            %layer,
            layers = self.warp.layer_count(),
            "edit committed"
        );
        Ok(layer)
    }

    /// Moves the top layer into the redo slot; returns its id.
    pub fn undo(&mut self) -> HistoryResult<LayerId> {
        tracing::debug!(layers = self.warp.layer_count(), "undo requested");
        self.ensure_consistent(HistoryOperation::Undo)?;
        self.undo_step(HistoryOperation::Undo, true)
    }

    fn undo_step(
        &mut self,
        operation: HistoryOperation,
        delete_shadowed_drawing: bool,
    ) -> HistoryResult<LayerId> {
        if self.warp.layer_count() <= 1 {
            tracing::warn!(%operation, "nothing to undo");
            return Err(HistoryError::invalid(
                operation,
                "only the base layer remains",
            ));
        }
        self.drop_redo_state(delete_shadowed_drawing);
        let layer = self
            .warp
            .remove_last_layer()
            .map_err(|err| HistoryError::inconsistent(err.to_string()))?;
        let id = layer.id();
        self.redo_slot = Some(layer);
        self.params.set_redo_transform_id(Some(id));

        // Drawings follow their layer whatever the last tool was.
        if let Some(drawing) = self.annotations.find_most_recent_active_with_layer(id) {
            self.annotations.deactivate(drawing)?;
            self.params.set_last_drawing_id(Some(drawing));
            tracing::debug!(%drawing, layer = %id, "drawing hidden by undo");
        } else if self.params.last_operation()? == LastOperation::Draw {
            tracing::warn!(layer = %id, "undone draw left no drawing to hide");
        }

        tracing::info!(
            %operation,
            layer = %id,
            layers = self.warp.layer_count(),
            "layer undone"
        );
        Ok(id)
    }

    /// Puts the undone layer back on top and shows its drawing again.
    pub fn redo(&mut self) -> HistoryResult<LayerId> {
        let operation = HistoryOperation::Redo;
        tracing::debug!("redo requested");
        self.ensure_consistent(operation)?;

        let Some(layer) = self.redo_slot.take() else {
            tracing::warn!("redo requested with an empty redo slot");
            return Err(HistoryError::invalid(operation, "no undone layer to reapply"));
        };
        let id = self
            .warp
            .reapply_layer(layer)
            .map_err(|err| HistoryError::inconsistent(err.to_string()))?;
        self.params.set_redo_transform_id(None);

        if let Some(drawing) = self.params.last_drawing_id()? {
            self.annotations.reactivate(drawing)?;
            self.params.set_last_drawing_id(None);
            tracing::debug!(%drawing, layer = %id, "drawing restored by redo");
        }

        tracing::info!(layer = %id, layers = self.warp.layer_count(), "layer redone");
        Ok(id)
    }

    /// Reverts every edit at once. Drawings are hidden, never deleted, and no
    /// redo is offered afterwards.
    pub fn undo_all(&mut self) -> HistoryResult<()> {
        let operation = HistoryOperation::UndoAll;
        tracing::debug!(layers = self.warp.layer_count(), "undo all requested");
        self.ensure_consistent(operation)?;

        self.params.set_last_operation(LastOperation::UndoAll);
        self.warp.collapse_above_base();
        if self.warp.layer_count() > 1 {
            self.undo_step(operation, false)?;
        }
        self.drop_redo_state(false);
        let hidden = self.annotations.deactivate_all();

        tracing::info!(hidden, "all edits undone");
        Ok(())
    }

    /// Permanently discards the redo layer and the drawing hidden with it.
    pub fn remove_redo_state(&mut self) {
        self.drop_redo_state(true);
    }

    /// Leaving the module or switching tools deselects the active effect and
    /// forfeits any pending redo.
    pub fn exit(&mut self) {
        tracing::debug!("edit session exit");
        self.params.set(keys::CURRENT_EFFECT, NO_EFFECT);
        self.remove_redo_state();
    }

    /// Moves a drawing in the subject hierarchy, e.g. when the host detaches it.
    pub fn move_annotation(
        &mut self,
        annotation: AnnotationId,
        parent: HierarchyParent,
    ) -> HistoryResult<()> {
        self.annotations.set_parent(annotation, parent)?;
        tracing::debug!(%annotation, ?parent, "drawing moved");
        Ok(())
    }

    /// Re-reads the session record the way the module does on every change.
    pub fn refresh(&mut self) -> HistoryResult<RefreshOutcome> {
        let mut exited = false;

        let resolution = self.params.resolution()?;
        if let Some(grid_resolution) = self.warp.base().deformation().resolution() {
            if (grid_resolution - resolution).abs() > RESOLUTION_TOLERANCE {
                tracing::info!(resolution, grid_resolution, "resolution changed");
                self.exit();
                exited = true;
            }
        }

        if self.params.get_bool(keys::SUBJECT_CHANGED)? {
            tracing::info!("subject changed");
            self.exit();
            self.params.set_bool(keys::SUBJECT_CHANGED, false);
            exited = true;
        }

        Ok(RefreshOutcome {
            controls: self.controls(),
            exited,
        })
    }

    fn drop_redo_state(&mut self, delete_drawing: bool) {
        let discarded = self.redo_slot.take().map(|layer| layer.id());
        self.params.set_redo_transform_id(None);

        if let Ok(Some(drawing)) = self.params.last_drawing_id() {
            if delete_drawing {
                match self.annotations.discard(drawing) {
                    Ok(_) => tracing::debug!(%drawing, "discarded hidden drawing"),
                    Err(err) => tracing::warn!(%err, "hidden drawing already gone"),
                }
            }
            self.params.set_last_drawing_id(None);
        }

        if let Some(layer) = discarded {
            // strokes undo could not hide (single-point, detached) go with their layer
            let swept = if delete_drawing {
                self.annotations.discard_for_layer(layer)
            } else {
                0
            };
            tracing::debug!(%layer, swept, "discarded redo layer");
        }
    }
}

//! Ledger of the marker sets left behind by draw edits.
//!
//! Each annotation points back at the warp layer its draw produced. Undo hides
//! an annotation instead of deleting it so that redo can bring it back.

use std::fmt;

use crate::geometry::GridPoint;
use crate::transform::LayerId;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationId(u64);

impl AnnotationId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of an annotation in the subject hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyParent {
    SceneRoot,
    Folder(u64),
    /// Removed from the live scene by the host.
    Detached,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    id: AnnotationId,
    parent: HierarchyParent,
    visible: bool,
    drawing: bool,
    layer: LayerId,
    control_points: Vec<GridPoint>,
}

impl Annotation {
    pub const fn id(&self) -> AnnotationId {
        self.id
    }

    pub const fn parent(&self) -> HierarchyParent {
        self.parent
    }

    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Tag carried by strokes that still belong to the live edit history.
    pub const fn is_active(&self) -> bool {
        self.drawing
    }

    pub const fn layer(&self) -> LayerId {
        self.layer
    }

    pub fn control_points(&self) -> &[GridPoint] {
        &self.control_points
    }

    /// Single-point strokes never take part in undo/redo.
    pub fn is_degenerate(&self) -> bool {
        self.control_points.len() <= 1
    }

    fn in_live_scene(&self) -> bool {
        self.parent != HierarchyParent::Detached
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    #[error("annotation {0} not found")]
    NotFound(AnnotationId),
    #[error("annotation {0} has fewer than two control points")]
    Degenerate(AnnotationId),
}

pub type AnnotationResult<T> = std::result::Result<T, AnnotationError>;

#[derive(Debug, Clone, Default)]
pub struct AnnotationLedger {
    annotations: Vec<Annotation>,
    next_id: u64,
}

impl AnnotationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> AnnotationId {
        let id = AnnotationId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    fn find_mut(&mut self, id: AnnotationId) -> AnnotationResult<&mut Annotation> {
        self.annotations
            .iter_mut()
            .find(|annotation| annotation.id == id)
            .ok_or(AnnotationError::NotFound(id))
    }

    pub fn record_annotation(
        &mut self,
        parent: HierarchyParent,
        layer: LayerId,
        control_points: Vec<GridPoint>,
    ) -> AnnotationId {
        let id = self.allocate_id();
        self.annotations.push(Annotation {
            id,
            parent,
            visible: true,
            drawing: true,
            layer,
            control_points,
        });
        id
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|annotation| annotation.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.annotations.iter().filter(|a| a.drawing).count()
    }

    /// Moves an annotation in the subject hierarchy.
    pub fn set_parent(&mut self, id: AnnotationId, parent: HierarchyParent) -> AnnotationResult<()> {
        self.find_mut(id)?.parent = parent;
        Ok(())
    }

    /// Hides the annotation, clears its drawing tag and parks it under the scene root.
    pub fn deactivate(&mut self, id: AnnotationId) -> AnnotationResult<()> {
        let annotation = self.find_mut(id)?;
        if annotation.is_degenerate() {
            return Err(AnnotationError::Degenerate(id));
        }
        annotation.parent = HierarchyParent::SceneRoot;
        annotation.visible = false;
        annotation.drawing = false;
        Ok(())
    }

    pub fn reactivate(&mut self, id: AnnotationId) -> AnnotationResult<()> {
        let annotation = self.find_mut(id)?;
        annotation.visible = true;
        annotation.drawing = true;
        Ok(())
    }

    /// Newest active, multi-point, in-scene annotation produced by `layer`.
    pub fn find_most_recent_active_with_layer(&self, layer: LayerId) -> Option<AnnotationId> {
        self.annotations
            .iter()
            .rev()
            .filter(|a| a.in_live_scene() && a.drawing && !a.is_degenerate())
            .find(|a| a.layer == layer)
            .map(|a| a.id)
    }

    /// Hides every active annotation, detached and single-point ones included;
    /// returns how many changed.
    pub fn deactivate_all(&mut self) -> usize {
        let mut changed = 0;
        for annotation in self.annotations.iter_mut().filter(|a| a.drawing) {
            annotation.parent = HierarchyParent::SceneRoot;
            annotation.visible = false;
            annotation.drawing = false;
            changed += 1;
        }
        changed
    }

    pub fn discard(&mut self, id: AnnotationId) -> AnnotationResult<Annotation> {
        let index = self
            .annotations
            .iter()
            .position(|annotation| annotation.id == id)
            .ok_or(AnnotationError::NotFound(id))?;
        Ok(self.annotations.remove(index))
    }

    /// Removes every annotation produced by `layer`; returns how many went.
    pub fn discard_for_layer(&mut self, layer: LayerId) -> usize {
        let before = self.annotations.len();
        self.annotations.retain(|annotation| annotation.layer != layer);
        before - self.annotations.len()
    }
}

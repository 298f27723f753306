//! Layered representation of an editable warp.
//!
//! A warp is kept as an ordered stack of composable layers. The bottom layer is
//! the base transform and can never be removed; every committed edit adds one
//! layer on top, so undo is exact: peel the top layer off.

mod displacement;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub use displacement::DisplacementGrid;

/// Deformation payload stored in a layer.
pub trait Deformation: Clone + fmt::Debug {
    /// Whether `other` samples the same space as `self` and may be stacked on it.
    fn is_compatible(&self, other: &Self) -> bool;

    /// Folds `next` into `self` so that `self` afterwards applies both, `self` first.
    fn compose(&mut self, next: &Self);

    /// Grid spacing, for deformations sampled on a lattice.
    fn resolution(&self) -> Option<f64> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

impl LayerId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

const LAYER_ID_PREFIX: &str = "WarpLayer";

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{LAYER_ID_PREFIX}{}", self.0)
    }
}

impl FromStr for LayerId {
    type Err = TransformError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .strip_prefix(LAYER_ID_PREFIX)
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Self)
            .ok_or_else(|| TransformError::MalformedLayerId(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("only the base layer remains")]
    BaseLayerOnly,
    #[error("layer {0} is already part of the stack")]
    DuplicateLayer(LayerId),
    #[error("malformed layer id: {0:?}")]
    MalformedLayerId(String),
    #[error("displacement field has {actual} vectors, grid expects {expected}")]
    FieldSize { expected: usize, actual: usize },
}

pub type TransformResult<T> = std::result::Result<T, TransformError>;

#[derive(Debug, Clone, PartialEq)]
pub struct TransformLayer<D> {
    id: LayerId,
    position: usize,
    deformation: D,
}

impl<D> TransformLayer<D> {
    pub const fn id(&self) -> LayerId {
        self.id
    }

    /// Index in the stack; `0` is the base.
    pub const fn position(&self) -> usize {
        self.position
    }

    pub const fn deformation(&self) -> &D {
        &self.deformation
    }

    pub fn into_deformation(self) -> D {
        self.deformation
    }
}

/// Ordered layer stack of one warp. Never empty.
#[derive(Debug, Clone)]
pub struct LayeredTransform<D> {
    layers: Vec<TransformLayer<D>>,
    next_id: u64,
}

impl<D: Deformation> LayeredTransform<D> {
    pub fn new(base: D) -> Self {
        let mut transform = Self {
            layers: Vec::new(),
            next_id: 0,
        };
        transform.append_layer(base);
        transform
    }

    fn allocate_id(&mut self) -> LayerId {
        let id = LayerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    pub fn append_layer(&mut self, deformation: D) -> LayerId {
        let id = self.allocate_id();
        let position = self.layers.len();
        self.layers.push(TransformLayer {
            id,
            position,
            deformation,
        });
        id
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[TransformLayer<D>] {
        &self.layers
    }

    pub fn base(&self) -> &TransformLayer<D> {
        &self.layers[0]
    }

    pub fn top(&self) -> &TransformLayer<D> {
        &self.layers[self.layers.len() - 1]
    }

    pub fn top_layer_id(&self) -> LayerId {
        self.top().id
    }

    pub fn layer(&self, id: LayerId) -> Option<&TransformLayer<D>> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    /// Pops the top layer and hands its data to the caller.
    pub fn remove_last_layer(&mut self) -> TransformResult<TransformLayer<D>> {
        if self.layers.len() <= 1 {
            return Err(TransformError::BaseLayerOnly);
        }
        self.layers.pop().ok_or(TransformError::BaseLayerOnly)
    }

    /// Pushes a previously removed layer back as the new top.
    pub fn reapply_layer(&mut self, mut layer: TransformLayer<D>) -> TransformResult<LayerId> {
        if self.layer(layer.id).is_some() {
            return Err(TransformError::DuplicateLayer(layer.id));
        }
        layer.position = self.layers.len();
        let id = layer.id;
        self.layers.push(layer);
        Ok(id)
    }

    /// Composes every layer into the base and drops the history above it.
    ///
    /// Returns `false` when the stack already holds only the base.
    pub fn flatten_to_base(&mut self) -> bool {
        if self.layers.len() <= 1 {
            return false;
        }
        let upper = self.layers.split_off(1);
        let base = &mut self.layers[0];
        for layer in &upper {
            base.deformation.compose(&layer.deformation);
        }
        tracing::debug!(
            folded = upper.len(),
            base = %base.id,
            "flattened warp layers into base"
        );
        true
    }

    /// Folds every edit layer into the first one above the base.
    ///
    /// The base keeps its own data, so removing the single remaining edit
    /// layer afterwards reverts every edit at once. Returns `false` when at
    /// most one edit layer exists.
    pub fn collapse_above_base(&mut self) -> bool {
        if self.layers.len() <= 2 {
            return false;
        }
        let upper = self.layers.split_off(2);
        let first = &mut self.layers[1];
        for layer in &upper {
            first.deformation.compose(&layer.deformation);
        }
        tracing::debug!(
            folded = upper.len(),
            into = %first.id,
            "collapsed warp edit layers"
        );
        true
    }

    /// Net deformation of the whole stack, history untouched.
    pub fn composed(&self) -> D {
        let mut net = self.layers[0].deformation.clone();
        for layer in &self.layers[1..] {
            net.compose(&layer.deformation);
        }
        net
    }
}

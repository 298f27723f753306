//! Session parameter record shared by the edit tools and the history controller.
//!
//! Every value is stored as a string under a well-known key; typed accessors
//! are layered on top. The record is created fully populated with defaults and
//! lives as long as the editing session.

mod bootstrap;
mod tools;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::annotation::AnnotationId;
use crate::transform::LayerId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use bootstrap::{BootstrapArgs, LEAD_MARKER_FILE};
pub use tools::{DrawSettings, SmoothSettings, SmudgeSettings, ToolDefaults};

pub mod keys {
    pub const WARP_ID: &str = "warpID";
    pub const REDO_TRANSFORM_ID: &str = "redoTransformID";
    pub const LAST_DRAWING_ID: &str = "lastDrawingID";
    pub const WARP_MODIFIED: &str = "warpModified";
    pub const LAST_OPERATION: &str = "lastOperation";
    pub const CURRENT_EFFECT: &str = "currentEffect";

    pub const SMUDGE_RADIUS: &str = "SmudgeRadius";
    pub const SMUDGE_HARDNESS: &str = "SmudgeHardness";
    pub const SMUDGE_FORCE: &str = "SmudgeForce";
    pub const SMUDGE_POST_SMOOTHING: &str = "SmudgePostSmoothing";
    pub const SMUDGE_SIGMA: &str = "SmudgeSigma";
    pub const EXPAND_GRID: &str = "expandGrid";
    pub const MAX_RADIUS: &str = "maxRadius";
    pub const GRID_BOUNDS_ROI_ID: &str = "gridBoundsROIID";

    pub const DRAW_SPREAD: &str = "DrawSpread";
    pub const DRAW_SAMPLE_DISTANCE: &str = "DrawSampleDistance";
    pub const DRAW_STIFFNESS: &str = "DrawStiffness";

    pub const SMOOTH_RADIUS: &str = "SmoothRadius";
    pub const SMOOTH_HARDNESS: &str = "SmoothHardness";
    pub const SMOOTH_SIGMA: &str = "SmoothSigma";
    pub const SMOOTH_USE_RADIUS: &str = "SmoothUseRadius";

    pub const GLANAT_COMPOSITE_ID: &str = "glanatCompositeID";
    pub const TEMPLATE_ID: &str = "templateID";
    pub const MODALITY: &str = "modality";
    pub const SUBJECT_PATHS: &str = "subjectPaths";
    pub const SUBJECT_PATH: &str = "subjectPath";
    pub const SUBJECT_N: &str = "subjectN";
    pub const SEPARATOR: &str = "separator";
    pub const MNI_PATH: &str = "MNIPath";
    pub const MNI_ATLAS_PATH: &str = "MNIAtlasPath";
    pub const ANTS_APPLY_TRANSFORMS_PATH: &str = "antsApplyTransformsPath";
    pub const SUBJECT_CHANGED: &str = "subjectChanged";
    pub const RESOLUTION: &str = "resolution";
}

/// `lastDrawingID` value meaning "no hidden drawing pending".
pub const NO_DRAWING_SENTINEL: &str = "-1";

const DEFAULTS: &[(&str, &str)] = &[
    (keys::WARP_ID, ""),
    (keys::REDO_TRANSFORM_ID, ""),
    (keys::LAST_DRAWING_ID, NO_DRAWING_SENTINEL),
    (keys::WARP_MODIFIED, "0"),
    (keys::LAST_OPERATION, ""),
    (keys::CURRENT_EFFECT, "None"),
    (keys::SMUDGE_RADIUS, "25"),
    (keys::SMUDGE_HARDNESS, "40"),
    (keys::SMUDGE_FORCE, "100"),
    (keys::SMUDGE_POST_SMOOTHING, "0"),
    (keys::SMUDGE_SIGMA, "10"),
    (keys::EXPAND_GRID, "0"),
    (keys::MAX_RADIUS, "50"),
    (keys::GRID_BOUNDS_ROI_ID, ""),
    (keys::DRAW_SPREAD, "15"),
    (keys::DRAW_SAMPLE_DISTANCE, "2"),
    (keys::DRAW_STIFFNESS, "0.1"),
    (keys::SMOOTH_RADIUS, "25"),
    (keys::SMOOTH_HARDNESS, "50"),
    (keys::SMOOTH_SIGMA, "5"),
    (keys::SMOOTH_USE_RADIUS, "1"),
    (keys::GLANAT_COMPOSITE_ID, ""),
    (keys::TEMPLATE_ID, ""),
    (keys::MODALITY, "t1"),
    (keys::SUBJECT_PATH, ""),
    (keys::SUBJECT_N, "0"),
    (keys::MNI_PATH, "."),
    (keys::MNI_ATLAS_PATH, "."),
    (keys::ANTS_APPLY_TRANSFORMS_PATH, ""),
    (keys::SUBJECT_CHANGED, "0"),
    (keys::RESOLUTION, "1"),
];

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown session parameter: {0}")]
    UnknownKey(String),
    #[error("session parameter {key}={value:?} is not a valid {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
    #[error("failed to parse session snapshot")]
    Snapshot(#[from] serde_json::Error),
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Tag of the most recent history-relevant operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LastOperation {
    #[default]
    None,
    Smudge,
    Draw,
    Smooth,
    UndoAll,
}

impl LastOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Smudge => "Smudge",
            Self::Draw => "Draw",
            Self::Smooth => "Smooth",
            Self::UndoAll => "UndoAll",
        }
    }
}

impl fmt::Display for LastOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LastOperation {
    type Err = SessionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "" => Ok(Self::None),
            "Smudge" => Ok(Self::Smudge),
            "Draw" => Ok(Self::Draw),
            "Smooth" => Ok(Self::Smooth),
            "UndoAll" => Ok(Self::UndoAll),
            other => Err(SessionError::InvalidValue {
                key: keys::LAST_OPERATION.to_string(),
                value: other.to_string(),
                expected: "operation tag",
            }),
        }
    }
}

/// Edit tools whose completed operations are committed to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTool {
    Smudge,
    Draw,
    Smooth,
}

impl EditTool {
    pub const fn operation(self) -> LastOperation {
        match self {
            Self::Smudge => LastOperation::Smudge,
            Self::Draw => LastOperation::Draw,
            Self::Smooth => LastOperation::Smooth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionParameters {
    values: BTreeMap<String, String>,
}

impl Default for SessionParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionParameters {
    pub fn new() -> Self {
        let mut values = DEFAULTS
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect::<BTreeMap<_, _>>();
        values.insert(
            keys::SEPARATOR.to_string(),
            uuid::Uuid::new_v4().simple().to_string(),
        );
        Self { values }
    }

    /// Defaults with tool settings taken from the user configuration.
    pub fn with_tool_defaults(defaults: &ToolDefaults) -> Self {
        let mut params = Self::new();
        defaults.apply(&mut params);
        params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn get_str(&self, key: &str) -> SessionResult<&str> {
        self.get(key)
            .ok_or_else(|| SessionError::UnknownKey(key.to_string()))
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        tracing::trace!(key, value = %value, "session parameter set");
        self.values.insert(key.to_string(), value);
    }

    fn parse_as<T: FromStr>(&self, key: &str, expected: &'static str) -> SessionResult<T> {
        let raw = self.get_str(key)?;
        raw.trim()
            .parse::<T>()
            .map_err(|_| SessionError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
                expected,
            })
    }

    pub fn get_int(&self, key: &str) -> SessionResult<i64> {
        self.parse_as(key, "integer")
    }

    pub fn get_float(&self, key: &str) -> SessionResult<f64> {
        self.parse_as(key, "number")
    }

    /// Integer flag; any non-zero value reads as `true`.
    pub fn get_bool(&self, key: &str) -> SessionResult<bool> {
        self.get_int(key).map(|value| value != 0)
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.set(key, value.to_string());
    }

    pub fn set_float(&mut self, key: &str, value: f64) {
        self.set(key, value.to_string());
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, if value { "1" } else { "0" });
    }

    pub fn warp_id(&self) -> &str {
        self.get(keys::WARP_ID).unwrap_or_default()
    }

    pub fn set_warp_id(&mut self, warp_id: &str) {
        self.set(keys::WARP_ID, warp_id);
    }

    pub fn redo_transform_id(&self) -> SessionResult<Option<LayerId>> {
        let raw = self.get_str(keys::REDO_TRANSFORM_ID)?;
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<LayerId>()
            .map(Some)
            .map_err(|_| SessionError::InvalidValue {
                key: keys::REDO_TRANSFORM_ID.to_string(),
                value: raw.to_string(),
                expected: "layer id",
            })
    }

    pub fn has_pending_redo(&self) -> bool {
        self.get(keys::REDO_TRANSFORM_ID)
            .is_some_and(|raw| !raw.is_empty())
    }

    pub fn set_redo_transform_id(&mut self, id: Option<LayerId>) {
        let value = id.map(|id| id.to_string()).unwrap_or_default();
        self.set(keys::REDO_TRANSFORM_ID, value);
    }

    pub fn last_drawing_id(&self) -> SessionResult<Option<AnnotationId>> {
        let raw = self.get_int(keys::LAST_DRAWING_ID)?;
        if raw < 0 {
            return Ok(None);
        }
        Ok(Some(AnnotationId::new(raw.unsigned_abs())))
    }

    pub fn set_last_drawing_id(&mut self, id: Option<AnnotationId>) {
        match id {
            Some(id) => self.set(keys::LAST_DRAWING_ID, id.to_string()),
            None => self.set(keys::LAST_DRAWING_ID, NO_DRAWING_SENTINEL),
        }
    }

    pub fn last_operation(&self) -> SessionResult<LastOperation> {
        self.get_str(keys::LAST_OPERATION)?.parse()
    }

    pub fn set_last_operation(&mut self, operation: LastOperation) {
        self.set(keys::LAST_OPERATION, operation.as_str());
    }

    pub fn resolution(&self) -> SessionResult<f64> {
        self.get_float(keys::RESOLUTION)
    }

    pub fn separator(&self) -> &str {
        self.get(keys::SEPARATOR).unwrap_or_default()
    }

    pub fn smudge_settings(&self) -> SessionResult<SmudgeSettings> {
        SmudgeSettings::load(self)
    }

    pub fn draw_settings(&self) -> SessionResult<DrawSettings> {
        DrawSettings::load(self)
    }

    pub fn smooth_settings(&self) -> SessionResult<SmoothSettings> {
        SmoothSettings::load(self)
    }

    pub fn to_json(&self) -> SessionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restores a snapshot on top of fresh defaults so no key is ever missing.
    pub fn from_json(serialized: &str) -> SessionResult<Self> {
        let snapshot: Self = serde_json::from_str(serialized)?;
        let mut params = Self::new();
        params.values.extend(snapshot.values);
        Ok(params)
    }
}

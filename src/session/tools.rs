use serde::Deserialize;

use super::{keys, SessionParameters, SessionResult};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SmudgeSettings {
    pub radius: f64,
    pub hardness: f64,
    pub force: f64,
    pub post_smoothing: bool,
    pub sigma: f64,
    pub expand_grid: bool,
    pub max_radius: f64,
}

impl Default for SmudgeSettings {
    fn default() -> Self {
        Self {
            radius: 25.0,
            hardness: 40.0,
            force: 100.0,
            post_smoothing: false,
            sigma: 10.0,
            expand_grid: false,
            max_radius: 50.0,
        }
    }
}

impl SmudgeSettings {
    pub(super) fn load(params: &SessionParameters) -> SessionResult<Self> {
        Ok(Self {
            radius: params.get_float(keys::SMUDGE_RADIUS)?,
            hardness: params.get_float(keys::SMUDGE_HARDNESS)?,
            force: params.get_float(keys::SMUDGE_FORCE)?,
            post_smoothing: params.get_bool(keys::SMUDGE_POST_SMOOTHING)?,
            sigma: params.get_float(keys::SMUDGE_SIGMA)?,
            expand_grid: params.get_bool(keys::EXPAND_GRID)?,
            max_radius: params.get_float(keys::MAX_RADIUS)?,
        })
    }

    pub fn store(&self, params: &mut SessionParameters) {
        params.set_float(keys::SMUDGE_RADIUS, self.radius);
        params.set_float(keys::SMUDGE_HARDNESS, self.hardness);
        params.set_float(keys::SMUDGE_FORCE, self.force);
        params.set_bool(keys::SMUDGE_POST_SMOOTHING, self.post_smoothing);
        params.set_float(keys::SMUDGE_SIGMA, self.sigma);
        params.set_bool(keys::EXPAND_GRID, self.expand_grid);
        params.set_float(keys::MAX_RADIUS, self.max_radius);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DrawSettings {
    pub spread: f64,
    pub sample_distance: f64,
    pub stiffness: f64,
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            spread: 15.0,
            sample_distance: 2.0,
            stiffness: 0.1,
        }
    }
}

impl DrawSettings {
    pub(super) fn load(params: &SessionParameters) -> SessionResult<Self> {
        Ok(Self {
            spread: params.get_float(keys::DRAW_SPREAD)?,
            sample_distance: params.get_float(keys::DRAW_SAMPLE_DISTANCE)?,
            stiffness: params.get_float(keys::DRAW_STIFFNESS)?,
        })
    }

    pub fn store(&self, params: &mut SessionParameters) {
        params.set_float(keys::DRAW_SPREAD, self.spread);
        params.set_float(keys::DRAW_SAMPLE_DISTANCE, self.sample_distance);
        params.set_float(keys::DRAW_STIFFNESS, self.stiffness);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SmoothSettings {
    pub radius: f64,
    pub hardness: f64,
    pub sigma: f64,
    pub use_radius: bool,
}

impl Default for SmoothSettings {
    fn default() -> Self {
        Self {
            radius: 25.0,
            hardness: 50.0,
            sigma: 5.0,
            use_radius: true,
        }
    }
}

impl SmoothSettings {
    pub(super) fn load(params: &SessionParameters) -> SessionResult<Self> {
        Ok(Self {
            radius: params.get_float(keys::SMOOTH_RADIUS)?,
            hardness: params.get_float(keys::SMOOTH_HARDNESS)?,
            sigma: params.get_float(keys::SMOOTH_SIGMA)?,
            use_radius: params.get_bool(keys::SMOOTH_USE_RADIUS)?,
        })
    }

    pub fn store(&self, params: &mut SessionParameters) {
        params.set_float(keys::SMOOTH_RADIUS, self.radius);
        params.set_float(keys::SMOOTH_HARDNESS, self.hardness);
        params.set_float(keys::SMOOTH_SIGMA, self.sigma);
        params.set_bool(keys::SMOOTH_USE_RADIUS, self.use_radius);
    }
}

/// Per-tool overrides read from `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ToolDefaults {
    #[serde(default)]
    pub smudge: Option<SmudgeSettings>,
    #[serde(default)]
    pub draw: Option<DrawSettings>,
    #[serde(default)]
    pub smooth: Option<SmoothSettings>,
}

impl ToolDefaults {
    pub fn apply(&self, params: &mut SessionParameters) {
        if let Some(smudge) = &self.smudge {
            smudge.store(params);
        }
        if let Some(draw) = &self.draw {
            draw.store(params);
        }
        if let Some(smooth) = &self.smooth {
            smooth.store(params);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_defaults_match_the_session_defaults() {
        let params = SessionParameters::new();
        assert_eq!(params.smudge_settings().unwrap(), SmudgeSettings::default());
        assert_eq!(params.draw_settings().unwrap(), DrawSettings::default());
        assert_eq!(params.smooth_settings().unwrap(), SmoothSettings::default());
    }

    #[test]
    fn stored_settings_read_back_unchanged() {
        let mut params = SessionParameters::new();
        let smudge = SmudgeSettings {
            radius: 12.5,
            post_smoothing: true,
            ..SmudgeSettings::default()
        };
        smudge.store(&mut params);

        assert_eq!(params.smudge_settings().unwrap(), smudge);
        assert_eq!(params.get(keys::SMUDGE_RADIUS), Some("12.5"));
        assert_eq!(params.get(keys::SMUDGE_POST_SMOOTHING), Some("1"));
    }

    #[test]
    fn tool_defaults_only_touch_configured_tools() {
        let defaults: ToolDefaults =
            serde_json::from_str(r#"{ "draw": { "spread": 30 } }"#).expect("parse defaults");
        let params = SessionParameters::with_tool_defaults(&defaults);

        let draw = params.draw_settings().unwrap();
        assert_eq!(draw.spread, 30.0);
        assert_eq!(draw.stiffness, 0.1);
        assert_eq!(params.smudge_settings().unwrap(), SmudgeSettings::default());
    }
}

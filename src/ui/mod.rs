//! Control-panel state: every slider, toggle and the pose selector.
//!
//! Values here are what the user sees. The editor writes them to the
//! selected node and reads them back from it on selection.

use crate::scene::color::SurfaceColor;
use crate::scene::serialization::{HelperFlags, UiFlags};

/// Inclusive slider bounds with the value restored on reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl SliderRange {
    pub const fn new(min: f32, max: f32, default: f32) -> Self {
        Self { min, max, default }
    }

    /// Clamp into range. Non-finite input falls back to the default.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_finite() {
            value.clamp(self.min, self.max)
        } else {
            self.default
        }
    }
}

pub const POSITION_RANGE: SliderRange = SliderRange::new(-10.0, 10.0, 0.0);
pub const VERTICAL_OFFSET_RANGE: SliderRange = SliderRange::new(-2.0, 5.0, 0.0);
pub const ROTATION_RANGE: SliderRange = SliderRange::new(-180.0, 180.0, 0.0);
pub const SCALE_RANGE: SliderRange = SliderRange::new(0.1, 3.0, 1.0);
pub const HUE_RANGE: SliderRange = SliderRange::new(0.0, 1.0, 0.6);
pub const BRIGHTNESS_RANGE: SliderRange = SliderRange::new(0.0, 1.0, 0.5);
pub const ROUGHNESS_RANGE: SliderRange = SliderRange::new(0.0, 1.0, 0.5);
pub const METALNESS_RANGE: SliderRange = SliderRange::new(0.0, 1.0, 0.1);
pub const UNIT_RANGE: SliderRange = SliderRange::new(0.0, 1.0, 0.5);
pub const LIGHT_INTENSITY_RANGE: SliderRange = SliderRange::new(0.0, 5.0, 1.0);
pub const LIGHT_ANGLE_RANGE: SliderRange = SliderRange::new(5.0, 90.0, 30.0);
pub const LIGHT_PENUMBRA_RANGE: SliderRange = SliderRange::new(0.0, 1.0, 0.2);
pub const LIGHT_POSITION_RANGES: [SliderRange; 3] = [
    SliderRange::new(-20.0, 20.0, 5.0),
    SliderRange::new(0.0, 30.0, 10.0),
    SliderRange::new(-20.0, 20.0, 5.0),
];

/// Saturation applied to object colors; only hue and lightness are user controlled.
pub const OBJECT_SATURATION: f32 = 0.8;

pub const DEFAULT_WALL: SurfaceColor = SurfaceColor::new(0.6, 0.2, 0.15);
pub const DEFAULT_FLOOR: SurfaceColor = SurfaceColor::new(0.0, 0.0, 0.5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectSliders {
    pub position_x: f32,
    pub position_z: f32,
    pub vertical_offset: f32,
    /// Degrees around X, Y, Z.
    pub rotation_deg: [f32; 3],
    pub relative_scale: f32,
    pub hue: f32,
    pub brightness: f32,
    pub roughness: f32,
    pub metalness: f32,
}

impl Default for ObjectSliders {
    fn default() -> Self {
        Self {
            position_x: POSITION_RANGE.default,
            position_z: POSITION_RANGE.default,
            vertical_offset: VERTICAL_OFFSET_RANGE.default,
            rotation_deg: [ROTATION_RANGE.default; 3],
            relative_scale: SCALE_RANGE.default,
            hue: HUE_RANGE.default,
            brightness: BRIGHTNESS_RANGE.default,
            roughness: ROUGHNESS_RANGE.default,
            metalness: METALNESS_RANGE.default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentSliders {
    pub wall: SurfaceColor,
    pub floor: SurfaceColor,
}

impl Default for EnvironmentSliders {
    fn default() -> Self {
        Self {
            wall: DEFAULT_WALL,
            floor: DEFAULT_FLOOR,
        }
    }
}

impl EnvironmentSliders {
    pub fn clamped(surface: SurfaceColor) -> SurfaceColor {
        SurfaceColor::new(
            HUE_RANGE.clamp(surface.hue),
            UNIT_RANGE.clamp(surface.saturation),
            UNIT_RANGE.clamp(surface.brightness),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSliders {
    pub intensity: f32,
    pub angle_deg: f32,
    pub penumbra: f32,
    pub position: [f32; 3],
}

impl Default for LightSliders {
    fn default() -> Self {
        Self {
            intensity: LIGHT_INTENSITY_RANGE.default,
            angle_deg: LIGHT_ANGLE_RANGE.default,
            penumbra: LIGHT_PENUMBRA_RANGE.default,
            position: [
                LIGHT_POSITION_RANGES[0].default,
                LIGHT_POSITION_RANGES[1].default,
                LIGHT_POSITION_RANGES[2].default,
            ],
        }
    }
}

impl LightSliders {
    pub fn clamped(&self) -> Self {
        Self {
            intensity: LIGHT_INTENSITY_RANGE.clamp(self.intensity),
            angle_deg: LIGHT_ANGLE_RANGE.clamp(self.angle_deg),
            penumbra: LIGHT_PENUMBRA_RANGE.clamp(self.penumbra),
            position: [
                LIGHT_POSITION_RANGES[0].clamp(self.position[0]),
                LIGHT_POSITION_RANGES[1].clamp(self.position[1]),
                LIGHT_POSITION_RANGES[2].clamp(self.position[2]),
            ],
        }
    }
}

/// Pose selector. An empty `selected` is the default pose.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PoseUi {
    pub enabled: bool,
    pub options: Vec<String>,
    pub selected: String,
}

impl PoseUi {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn populate(&mut self, options: Vec<String>, selected: &str) {
        self.enabled = true;
        self.selected = if options.iter().any(|name| name == selected) {
            selected.to_string()
        } else {
            String::new()
        };
        self.options = options;
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct UiState {
    pub object: ObjectSliders,
    pub environment: EnvironmentSliders,
    pub light: LightSliders,
    pub pose: PoseUi,
    pub helpers: HelperFlags,
    pub flags: UiFlags,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore every slider to its declared default. Toggles are left alone.
    pub fn reset_sliders(&mut self) {
        self.object = ObjectSliders::default();
        self.environment = EnvironmentSliders::default();
        self.light = LightSliders::default();
    }
}

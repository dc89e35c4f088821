use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::InitError;
use crate::input::DragButton;

//
// ──────────────────────────────────────────────────────────────
//   Environment
//
//   ORBIT_CUBES_VARIANT  rubik | single | static
//   ORBIT_CUBES_CONFIG   path to a JSON file; its fields are
//                        merged over the selected preset
// ──────────────────────────────────────────────────────────────
//

pub const VARIANT_ENV: &str = "ORBIT_CUBES_VARIANT";
pub const CONFIG_ENV: &str = "ORBIT_CUBES_CONFIG";

const SHADER_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant
{
  /// 3×3×3 block of cubes minus the centre, orbit camera
  #[default]
  Rubik,
  /// One cube, orbit camera
  Single,
  /// One cube, fixed camera, position-derived colours
  Static,
}

impl FromStr for Variant
{
  type Err = InitError;

  fn from_str(s: &str) -> Result<Self, Self::Err>
  {
    match s.trim().to_ascii_lowercase().as_str()
    {
      "rubik" => Ok(Variant::Rubik),
      "single" => Ok(Variant::Single),
      "static" => Ok(Variant::Static),
      other => Err(InitError::UnknownVariant(other.to_string())),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraMode
{
  Orbit,
  Fixed,
}

//
// ──────────────────────────────────────────────────────────────
//   Sections
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig
{
  pub width: u32,
  pub height: u32,
  pub title: String,
}

impl Default for WindowConfig
{
  fn default() -> Self
  {
    Self { width: 640, height: 480, title: "orbit-cubes".into() }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderPaths
{
  pub vertex: PathBuf,
  pub fragment: PathBuf,
}

impl Default for ShaderPaths
{
  fn default() -> Self
  {
    Self {
      vertex: Path::new(SHADER_DIR).join("simple_mvp.vert.wgsl"),
      fragment: Path::new(SHADER_DIR).join("face_colors.frag.wgsl"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig
{
  pub mode: CameraMode,
  pub radius: f32,
  /// Radians per pixel of cursor travel.
  pub sensitivity: f32,
  pub pitch_limit: f32,
  pub initial_yaw: f32,
  pub initial_pitch: f32,
  pub drag_button: DragButton,
  /// Eye distance for the fixed camera.
  pub fixed_distance: f32,
}

impl Default for CameraConfig
{
  fn default() -> Self
  {
    Self {
      mode: CameraMode::Orbit,
      radius: 8.0,
      sensitivity: 0.005,
      pitch_limit: 1.0,
      initial_yaw: std::f32::consts::FRAC_PI_2,
      initial_pitch: 0.0,
      drag_button: DragButton::Right,
      fixed_distance: 8.0,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig
{
  /// Instances span -extent..=extent on each axis.
  pub extent: i32,
  pub scale: f32,
  pub spacing: f32,
  pub skip_origin: bool,
}

impl Default for GridConfig
{
  fn default() -> Self
  {
    Self { extent: 1, scale: 1.0, spacing: 0.1, skip_origin: true }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig
{
  pub fov_y_degrees: f32,
  pub near: f32,
  pub far: f32,
}

impl Default for ProjectionConfig
{
  fn default() -> Self
  {
    Self { fov_y_degrees: 45.0, near: 0.1, far: 100.0 }
  }
}

//
// ──────────────────────────────────────────────────────────────
//   DemoConfig
// ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig
{
  pub variant: Variant,
  pub window: WindowConfig,
  pub shaders: ShaderPaths,
  pub camera: CameraConfig,
  pub grid: GridConfig,
  pub projection: ProjectionConfig,
  pub clear_color: [f64; 4],
}

impl Default for DemoConfig
{
  fn default() -> Self
  {
    Self::preset(Variant::Rubik)
  }
}

impl DemoConfig
{
  pub fn preset(variant: Variant) -> Self
  {
    let mut config = Self {
      variant,
      window: WindowConfig::default(),
      shaders: ShaderPaths::default(),
      camera: CameraConfig::default(),
      grid: GridConfig::default(),
      projection: ProjectionConfig::default(),
      clear_color: [0.95, 0.95, 0.95, 1.0],
    };

    match variant
    {
      Variant::Rubik =>
      {}
      Variant::Single =>
      {
        config.grid = GridConfig { extent: 0, skip_origin: false, ..GridConfig::default() };
      }
      Variant::Static =>
      {
        config.grid = GridConfig { extent: 0, skip_origin: false, ..GridConfig::default() };
        config.camera.mode = CameraMode::Fixed;
        config.shaders.fragment = Path::new(SHADER_DIR).join("position_colors.frag.wgsl");
      }
    }

    config
  }
}

//
// ──────────────────────────────────────────────────────────────
//   Loading
// ──────────────────────────────────────────────────────────────
//

pub fn load() -> Result<DemoConfig, InitError>
{
  let variant = std::env::var(VARIANT_ENV).ok();

  let overrides = match std::env::var_os(CONFIG_ENV)
  {
    Some(path) => Some(read_overrides(Path::new(&path))?),
    None => None,
  };

  let config = resolve(variant.as_deref(), overrides)?;
  log::info!("variant {:?}", config.variant);

  Ok(config)
}

fn read_overrides(path: &Path) -> Result<Value, InitError>
{
  let text = std::fs::read_to_string(path)
    .map_err(|source| InitError::ConfigRead { path: path.to_path_buf(), source })?;

  serde_json::from_str(&text).map_err(|source| InitError::ConfigParse { path: path.to_path_buf(), source })
}

/// The variant comes from the environment, then the override file, then
/// the default. Overrides are merged field by field over that preset.
pub fn resolve(variant: Option<&str>, overrides: Option<Value>) -> Result<DemoConfig, InitError>
{
  let variant = match (variant, overrides.as_ref().and_then(|o| o.get("variant")))
  {
    (Some(name), _) => name.parse()?,
    (None, Some(Value::String(name))) => name.parse()?,
    (None, Some(other)) => return Err(InitError::UnknownVariant(other.to_string())),
    (None, None) => Variant::default(),
  };

  let preset = DemoConfig::preset(variant);

  let Some(overrides) = overrides
  else
  {
    return Ok(preset);
  };

  let mut merged = serde_json::to_value(&preset).map_err(InitError::ConfigMerge)?;
  merge(&mut merged, overrides);

  let mut config: DemoConfig = serde_json::from_value(merged).map_err(InitError::ConfigMerge)?;
  config.variant = variant;

  Ok(config)
}

fn merge(base: &mut Value, patch: Value)
{
  match (base, patch)
  {
    (Value::Object(base), Value::Object(patch)) =>
    {
      for (key, value) in patch
      {
        merge(base.entry(key).or_insert(Value::Null), value);
      }
    }
    (base, patch) => *base = patch,
  }
}

// config.rs — JSON 配置 (窗口 / 球体分辨率 / 纹理 / 场景参数)
//
// 查找顺序：
// - CLI: --config <path>
// - Env: LUNAR_CONFIG
// - <exe_dir>/assets/config.json
// - ./assets/config.json
// - 内置默认值

use crate::error::ConfigError;
use crate::tangent::TangentOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub spheres: SphereConfig,
    pub textures: TextureConfig,
    pub scene: SceneConfig,
    pub camera: CameraConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 800,
            title: "Simplified Solar System: Earth & Moon".to_owned(),
            vsync: true,
        }
    }
}

/// Tessellation resolution per sphere instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereConfig {
    pub sky: u32,
    pub moon: u32,
    pub earth: u32,
    pub tangents: TangentOptions,
}

impl Default for SphereConfig {
    fn default() -> Self {
        Self {
            sky: 500,
            moon: 500,
            earth: 500,
            tangents: TangentOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    pub sky: PathBuf,
    pub moon: PathBuf,
    pub moon_normal: PathBuf,
    pub earth: PathBuf,
    pub earth_normal: PathBuf,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            sky: PathBuf::from("assets/nightskyT.png"),
            moon: PathBuf::from("assets/moontexture.jpg"),
            moon_normal: PathBuf::from("assets/moonnormal.jpg"),
            earth: PathBuf::from("assets/Earth.tga"),
            earth_normal: PathBuf::from("assets/earth_normals.jpg"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub light: [f32; 3],
    /// Spin rate about Y.
    pub deg_per_sec: f32,
    pub orbit_speed: f32,
    pub orbit_speed_step: f32,
    /// Orbit half-axes along X and Z.
    pub orbit_radius: [f32; 2],
    pub moon_height: f32,
    pub moon_scale: f32,
    pub sky_scale: f32,
    pub texture_scale: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            light: [2.7, 2.3, 5.3],
            deg_per_sec: 23.0,
            orbit_speed: 2.0,
            orbit_speed_step: 0.5,
            orbit_radius: [1.5, 2.0],
            moon_height: 0.3,
            moon_scale: 0.3,
            sky_scale: 25.0,
            texture_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub distance: f32,
    pub fov: f32,
    pub sensitivity: f32,
    pub walk_step: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 10.0,
            fov: 60.0,
            sensitivity: 1.0,
            walk_step: 0.5,
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolves the config path from args/env/assets and loads it. Falls
    /// back to defaults (with a warning) when nothing usable is found.
    pub fn load(args: &[String]) -> Self {
        let Some(path) = resolve_path(args) else {
            log::info!("no config file found, using defaults");
            return Self::default();
        };

        match Self::from_file(&path) {
            Ok(config) => {
                log::info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }
}

fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == name {
            return iter.next().cloned();
        }
        if let Some(value) = arg.strip_prefix(&prefix) {
            return Some(value.to_owned());
        }
    }
    None
}

fn resolve_path(args: &[String]) -> Option<PathBuf> {
    if let Some(p) = arg_value(args, "--config") {
        return Some(PathBuf::from(p));
    }
    if let Ok(p) = std::env::var("LUNAR_CONFIG") {
        if !p.trim().is_empty() {
            return Some(PathBuf::from(p));
        }
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("assets").join("config.json");
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = PathBuf::from("assets").join("config.json");
    p.exists().then_some(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tangent::NormalPolicy;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_object_is_default() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.spheres.earth, 500);
        assert_eq!(config.scene.light, [2.7, 2.3, 5.3]);
    }

    #[test]
    fn test_partial_override() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "spheres": { "moon": 64, "tangents": { "normals": "face_weighted" } },
                "scene": { "orbit_speed": 3.5 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.spheres.moon, 64);
        assert_eq!(config.spheres.earth, 500);
        assert_eq!(config.spheres.tangents.normals, NormalPolicy::FaceWeighted);
        assert!(config.spheres.tangents.orthogonalize);
        assert_eq!(config.scene.orbit_speed, 3.5);
        assert_eq!(config.scene.deg_per_sec, 23.0);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = AppConfig::from_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_arg_value_forms() {
        assert_eq!(
            arg_value(&args(&["app", "--config", "a.json"]), "--config"),
            Some("a.json".to_owned())
        );
        assert_eq!(
            arg_value(&args(&["app", "--config=b.json"]), "--config"),
            Some("b.json".to_owned())
        );
        assert_eq!(arg_value(&args(&["app", "--config"]), "--config"), None);
        assert_eq!(arg_value(&args(&["app"]), "--config"), None);
    }

    #[test]
    fn test_cli_path_wins() {
        assert_eq!(
            resolve_path(&args(&["app", "--config", "custom.json"])),
            Some(PathBuf::from("custom.json"))
        );
    }
}

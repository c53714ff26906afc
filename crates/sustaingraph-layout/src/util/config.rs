use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Physics constants, canvas geometry and loop pacing for one layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    pub node_radius: f64,
    pub repulsion: f64,
    pub rest_length: f64,
    pub spring_stiffness: f64,
    pub weight_factor: f64,
    pub damping: f64,
    pub time_step: f64,
    pub boundary_margin: f64,
    pub epsilon: f64,
    pub threshold: f64,
    pub seed: u64,
    pub spawn_inset_x: f64,
    pub spawn_inset_y: f64,
    pub frame_interval_ms: u64,
    pub settle_energy: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 480.0,
            node_radius: 16.0,
            repulsion: 9000.0,
            rest_length: 120.0,
            spring_stiffness: 0.05,
            weight_factor: 0.05,
            damping: 0.85,
            time_step: 0.8,
            boundary_margin: 40.0,
            epsilon: 0.01,
            threshold: 30.0,
            seed: 42,
            spawn_inset_x: 100.0,
            spawn_inset_y: 80.0,
            frame_interval_ms: 16,
            settle_energy: 1e-4,
        }
    }
}

/// Axis-aligned rectangle, inclusive on every side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (x.clamp(self.min_x, self.max_x), y.clamp(self.min_y, self.max_y))
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("width", self.width),
            ("height", self.height),
            ("node_radius", self.node_radius),
            ("repulsion", self.repulsion),
            ("rest_length", self.rest_length),
            ("spring_stiffness", self.spring_stiffness),
            ("weight_factor", self.weight_factor),
            ("damping", self.damping),
            ("time_step", self.time_step),
            ("boundary_margin", self.boundary_margin),
            ("epsilon", self.epsilon),
            ("threshold", self.threshold),
            ("spawn_inset_x", self.spawn_inset_x),
            ("spawn_inset_y", self.spawn_inset_y),
            ("settle_energy", self.settle_energy),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
        }

        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(ConfigError::EmptyCanvas {
                width: self.width,
                height: self.height,
            });
        }
        if self.boundary_margin < 0.0 {
            return Err(ConfigError::Negative {
                field: "boundary_margin",
                value: self.boundary_margin,
            });
        }
        if self.boundary_margin * 2.0 >= self.width || self.boundary_margin * 2.0 >= self.height {
            return Err(ConfigError::MarginTooLarge {
                margin: self.boundary_margin,
                width: self.width,
                height: self.height,
            });
        }
        if self.time_step <= 0.0 {
            return Err(ConfigError::TimeStep(self.time_step));
        }
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(ConfigError::Damping(self.damping));
        }
        if self.epsilon <= 0.0 {
            return Err(ConfigError::Epsilon(self.epsilon));
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::FrameInterval);
        }

        let non_negative = [
            ("node_radius", self.node_radius),
            ("repulsion", self.repulsion),
            ("rest_length", self.rest_length),
            ("spring_stiffness", self.spring_stiffness),
            ("weight_factor", self.weight_factor),
            ("spawn_inset_x", self.spawn_inset_x),
            ("spawn_inset_y", self.spawn_inset_y),
            ("settle_energy", self.settle_energy),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }

    /// The rectangle every free node is clamped into after a tick.
    pub fn bounds(&self) -> Rect {
        Rect {
            min_x: self.boundary_margin,
            min_y: self.boundary_margin,
            max_x: self.width - self.boundary_margin,
            max_y: self.height - self.boundary_margin,
        }
    }

    /// Where freshly created nodes are dropped. Falls back to `bounds()` per
    /// axis when the inset leaves nothing.
    pub fn spawn_rect(&self) -> Rect {
        let bounds = self.bounds();
        let inset_x = self.spawn_inset_x.max(self.boundary_margin);
        let inset_y = self.spawn_inset_y.max(self.boundary_margin);

        let (min_x, max_x) = if inset_x * 2.0 <= self.width {
            (inset_x, self.width - inset_x)
        } else {
            (bounds.min_x, bounds.max_x)
        };
        let (min_y, max_y) = if inset_y * 2.0 <= self.height {
            (inset_y, self.height - inset_y)
        } else {
            (bounds.min_y, bounds.max_y)
        };
        Rect {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    /// Clamp a requested threshold into [0, 100]; NaN keeps `fallback`.
    pub fn clamp_threshold(requested: f64, fallback: f64) -> f64 {
        if requested.is_nan() {
            return fallback.clamp(0.0, 100.0);
        }
        requested.clamp(0.0, 100.0)
    }
}

fn config_file_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "sustaingraph")?;
    Some(proj.config_dir().join("layout.toml"))
}

pub fn load_or_default() -> LayoutConfig {
    let Some(path) = config_file_path() else {
        return LayoutConfig::default();
    };
    load_or_default_from_path(&path)
}

pub fn load_or_default_from_path(path: &Path) -> LayoutConfig {
    let Ok(contents) = fs::read_to_string(path) else {
        return LayoutConfig::default();
    };
    toml::from_str(&contents).unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), %err, "ignoring unreadable layout config");
        LayoutConfig::default()
    })
}

/// Strict variant for paths the user named explicitly.
pub fn load_from_path(path: &Path) -> anyhow::Result<LayoutConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read layout config {}", path.display()))?;
    let cfg: LayoutConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse layout config {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid layout config {}", path.display()))?;
    Ok(cfg)
}

pub fn save(cfg: &LayoutConfig) -> anyhow::Result<()> {
    let Some(path) = config_file_path() else {
        return Err(anyhow::anyhow!("no config directory available"));
    };
    save_to_path(cfg, &path)
}

pub fn save_to_path(cfg: &LayoutConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let data = toml::to_string_pretty(cfg).context("failed to serialize layout config")?;
    fs::write(path, data)
        .with_context(|| format!("failed to write layout config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn layout_config_roundtrip_save_load() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("layout.toml");
        let cfg = LayoutConfig {
            threshold: 55.0,
            seed: 7,
            ..LayoutConfig::default()
        };

        save_to_path(&cfg, &path).expect("save config");
        let loaded = load_or_default_from_path(&path);

        assert_eq!(cfg, loaded);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("layout.toml");
        fs::write(&path, "damping = 0.5\nwidth = 640.0\n").expect("write");

        let cfg = load_from_path(&path).expect("load");
        assert_eq!(cfg.damping, 0.5);
        assert_eq!(cfg.width, 640.0);
        assert_eq!(cfg.height, LayoutConfig::default().height);
    }

    #[test]
    fn garbage_file_falls_back_to_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("layout.toml");
        fs::write(&path, "width = \"wide\"").expect("write");

        assert_eq!(load_or_default_from_path(&path), LayoutConfig::default());
        assert!(load_from_path(&path).is_err());
    }

    #[test]
    fn strict_load_rejects_invalid_physics() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("layout.toml");
        fs::write(&path, "time_step = -1.0\n").expect("write");

        let err = load_from_path(&path).expect_err("negative time step");
        assert!(format!("{err:#}").contains("time step"));
    }

    #[test]
    fn defaults_are_valid() {
        LayoutConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn rejects_degenerate_geometry() {
        let cfg = LayoutConfig {
            width: 0.0,
            ..LayoutConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyCanvas { .. })));

        let cfg = LayoutConfig {
            boundary_margin: 240.0,
            ..LayoutConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MarginTooLarge { .. })
        ));

        let cfg = LayoutConfig {
            damping: 1.5,
            ..LayoutConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Damping(_))));

        let cfg = LayoutConfig {
            repulsion: f64::NAN,
            ..LayoutConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NotFinite { field: "repulsion" })
        ));
    }

    #[test]
    fn spawn_rect_uses_inset_and_falls_back_when_too_small() {
        let cfg = LayoutConfig::default();
        let spawn = cfg.spawn_rect();
        assert_eq!((spawn.min_x, spawn.max_x), (100.0, 900.0));
        assert_eq!((spawn.min_y, spawn.max_y), (80.0, 400.0));

        let small = LayoutConfig {
            width: 150.0,
            height: 120.0,
            boundary_margin: 10.0,
            ..LayoutConfig::default()
        };
        let spawn = small.spawn_rect();
        assert_eq!(spawn, small.bounds());
    }

    #[test]
    fn threshold_is_clamped() {
        assert_eq!(LayoutConfig::clamp_threshold(150.0, 30.0), 100.0);
        assert_eq!(LayoutConfig::clamp_threshold(-5.0, 30.0), 0.0);
        assert_eq!(LayoutConfig::clamp_threshold(f64::NAN, 30.0), 30.0);
        assert_eq!(LayoutConfig::clamp_threshold(45.0, 30.0), 45.0);
    }
}

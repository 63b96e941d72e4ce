// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::scene::Scene;
use crate::error::TracerError;
use crate::constants::resolve_resource_path;

pub fn load_scene(path: &Path) -> Result<Scene> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene file: {}", path.display()))?;

    let mut scene = parse_scene(&contents, path.extension().and_then(|e| e.to_str()))
        .with_context(|| format!("Failed to parse scene file: {}", path.display()))?;

    // Resolve the environment path so scenes work from any CWD.
    let scene_dir = path.parent().unwrap_or(Path::new("."));
    if let Some(ref env) = scene.environment {
        scene.environment = Some(resolve_resource_path(scene_dir, env));
    }

    log::info!(
        "Loaded scene: {} spheres ({} ray traced)",
        scene.spheres.len(),
        scene.spheres.iter().filter(|s| s.is_ray_traced()).count()
    );

    Ok(scene)
}

/// Parse scene text; the format follows the file extension, YAML when there is none.
pub fn parse_scene(contents: &str, extension: Option<&str>) -> Result<Scene> {
    let mut scene: Scene = match extension {
        Some("json") => serde_json::from_str(contents).context("Invalid JSON scene")?,
        Some("yaml" | "yml") | None => {
            serde_yml::from_str(contents).context("Invalid YAML scene")?
        }
        Some(other) => return Err(TracerError::UnsupportedSceneFormat(other.to_string()).into()),
    };
    scene.settings.sanitize();
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_scene() {
        let scene = parse_scene(
            r#"{ "spheres": [ { "position": [1.0, 2.0, 3.0] } ] }"#,
            Some("json"),
        )
        .unwrap();
        assert_eq!(scene.spheres.len(), 1);
        assert_eq!(scene.spheres[0].position, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_out_of_range_settings_clamped_on_load() {
        let scene = parse_scene("settings:\n  max_bounces: 99\n  rays_per_pixel: 0\n", None).unwrap();
        assert_eq!(scene.settings.max_bounces(), 32);
        assert_eq!(scene.settings.rays_per_pixel(), 1);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = parse_scene("spheres: []", Some("toml")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TracerError>(),
            Some(TracerError::UnsupportedSceneFormat(ext)) if ext == "toml"
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(parse_scene("spheres: 12", Some("yaml")).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_scene(Path::new("does/not/exist.yaml")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read scene file"));
    }

    #[test]
    fn test_bundled_scenes_parse() {
        use crate::scene::sphere::SceneQuery;

        let demo = parse_scene(
            include_str!("../../resources/scenes/demo.yaml"),
            Some("yaml"),
        )
        .unwrap();
        assert_eq!(demo.spheres.len(), 5);
        assert_eq!(demo.sphere_instances().len(), 4);
        assert!(!demo.settings.enable_shader);

        let cornell = parse_scene(
            include_str!("../../resources/scenes/cornell.json"),
            Some("json"),
        )
        .unwrap();
        assert_eq!(cornell.sphere_instances().len(), 5);
        assert_eq!(cornell.settings.max_bounces(), 6);
    }
}

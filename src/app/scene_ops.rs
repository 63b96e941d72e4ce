use std::path::Path;

use crate::camera::Camera;
use crate::io::environment::EnvironmentImage;

use super::state::{AppState, scene_label};

impl AppState {
    /// Replace the current scene. The tracer restarts accumulation through its
    /// own invalidation checks once the new spheres and camera are observed.
    pub fn open_scene(&mut self, path: &Path) {
        match crate::scene::loader::load_scene(path) {
            Ok(scene) => {
                self.camera = Camera::from_config(&scene.camera);
                self.tracer.set_settings(scene.settings);
                self.ui_state.sync_settings(self.tracer.settings());

                let environment = EnvironmentImage::load_or_default(scene.environment.as_deref());
                self.tracer.set_environment(&environment);

                self.scene = scene;
                self.scene_path = Some(path.to_path_buf());
                self.ui_state.scene_name = scene_label(Some(path));
                log::info!("Opened scene: {}", path.display());
            }
            Err(e) => log::error!("Failed to open scene: {e:#}"),
        }
    }

    /// Show the open dialog on a worker thread; the result arrives on `file_dialog_rx`.
    pub fn spawn_open_dialog(&self) {
        let tx = self.file_dialog_tx.clone();
        let start_dir = self
            .scene_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf);
        std::thread::spawn(move || {
            let mut dialog =
                rfd::FileDialog::new().add_filter("Scene", &["yaml", "yml", "json"]);
            if let Some(dir) = start_dir {
                dialog = dialog.set_directory(dir);
            }
            if let Some(path) = dialog.pick_file() {
                let _ = tx.send(super::state::FileDialogResult::OpenScene(path));
            }
        });
    }
}

use anyhow::{Context, Result, bail};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Shader sources compiled into the binary, keyed by module name.
const EMBEDDED_MODULES: &[(&str, &str)] = &[
    ("common::random", include_str!("wgsl/common/random.wgsl")),
    ("common::scene", include_str!("wgsl/common/scene.wgsl")),
    ("path_trace", include_str!("wgsl/path_trace.wgsl")),
    ("composite", include_str!("wgsl/composite.wgsl")),
    ("blit", include_str!("wgsl/blit.wgsl")),
];

/// Entry points the renderer builds pipelines from.
pub const ENTRY_MODULES: &[&str] = &["path_trace", "composite", "blit"];

const SHADER_DIR_ENV: &str = "SPHERE_TRACER_SHADER_DIR";

/// WGSL shader composer that resolves `// #import module_name` directives.
///
/// Imports are emitted before the importing module, each module at most once.
pub struct ShaderComposer {
    modules: HashMap<String, String>,
}

impl ShaderComposer {
    pub fn embedded() -> Self {
        let mut composer = Self {
            modules: HashMap::new(),
        };
        for &(name, source) in EMBEDDED_MODULES {
            composer.register(name, source);
        }
        composer
    }

    /// Embedded shaders, overridden by files under `$SPHERE_TRACER_SHADER_DIR` when set.
    /// Lets shader edits be tried without rebuilding.
    pub fn load() -> Result<Self> {
        let mut composer = Self::embedded();
        if let Some(dir) = std::env::var_os(SHADER_DIR_ENV).map(PathBuf::from) {
            let overrides = Self::from_directory(&dir)?;
            log::info!(
                "{SHADER_DIR_ENV}={}: {} shader modules override the built-in set",
                dir.display(),
                overrides.modules.len()
            );
            composer.modules.extend(overrides.modules);
        }
        Ok(composer)
    }

    /// Load all `.wgsl` files from a directory tree.
    pub fn from_directory(dir: &Path) -> Result<Self> {
        let mut modules = HashMap::new();
        Self::load_dir(dir, dir, &mut modules)?;
        Ok(Self { modules })
    }

    fn load_dir(base: &Path, dir: &Path, modules: &mut HashMap<String, String>) -> Result<()> {
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read shader directory: {}", dir.display()))?
        {
            let path = entry?.path();
            if path.is_dir() {
                Self::load_dir(base, &path, modules)?;
            } else if path.extension().is_some_and(|ext| ext == "wgsl") {
                let source = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read shader: {}", path.display()))?;
                modules.insert(module_name(base, &path), source);
            }
        }
        Ok(())
    }

    /// Compose a shader by resolving all imports recursively.
    pub fn compose(&self, entry_module: &str) -> Result<String> {
        let mut output = String::new();
        let mut done = HashSet::new();
        let mut stack = Vec::new();
        self.resolve(entry_module, &mut output, &mut done, &mut stack)?;
        Ok(output)
    }

    fn resolve(
        &self,
        module_name: &str,
        output: &mut String,
        done: &mut HashSet<String>,
        stack: &mut Vec<String>,
    ) -> Result<()> {
        if done.contains(module_name) {
            return Ok(());
        }
        if stack.iter().any(|m| m == module_name) {
            bail!(
                "Shader import cycle: {} -> {module_name}",
                stack.join(" -> ")
            );
        }

        let source = self.modules.get(module_name).with_context(|| match stack.last() {
            Some(parent) => format!("Shader module not found: {module_name} (imported by {parent})"),
            None => format!("Shader module not found: {module_name}"),
        })?;

        stack.push(module_name.to_string());
        let mut body = String::new();
        for line in source.lines() {
            if let Some(import_name) = line.trim().strip_prefix("// #import ") {
                self.resolve(import_name.trim(), output, done, stack)?;
            } else {
                body.push_str(line);
                body.push('\n');
            }
        }
        stack.pop();

        done.insert(module_name.to_string());
        output.push_str(&body);
        output.push('\n');
        Ok(())
    }

    pub fn register(&mut self, name: &str, source: &str) {
        self.modules.insert(name.to_string(), source.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }
}

/// `base/common/scene.wgsl` -> `common::scene`
fn module_name(base: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path).with_extension("");
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("::")
}

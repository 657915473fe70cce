//! Shader sources
//!
//! Both shaders are compiled into the binary. An override directory can be
//! given on the command line to iterate on them without rebuilding; files
//! that cannot be read fall back to the embedded source.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const RAYTRACING_SHADER: &str = include_str!("../shaders/raytracing.wgsl");
pub const COMPOSITE_SHADER: &str = include_str!("../shaders/composite.wgsl");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    Raytracing,
    Composite,
}

impl ShaderKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            ShaderKind::Raytracing => "raytracing.wgsl",
            ShaderKind::Composite => "composite.wgsl",
        }
    }

    pub fn embedded(&self) -> &'static str {
        match self {
            ShaderKind::Raytracing => RAYTRACING_SHADER,
            ShaderKind::Composite => COMPOSITE_SHADER,
        }
    }
}

#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("Failed to read shader {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where shader source comes from
#[derive(Debug, Clone, Default)]
pub struct ShaderLibrary {
    override_dir: Option<PathBuf>,
}

impl ShaderLibrary {
    /// Embedded sources only
    pub fn embedded() -> Self {
        Self::default()
    }

    pub fn with_override_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: Some(dir.into()),
        }
    }

    pub fn override_dir(&self) -> Option<&Path> {
        self.override_dir.as_deref()
    }

    /// Read the on-disk override. `Ok(None)` when no override directory is set.
    pub fn read_override(&self, kind: ShaderKind) -> Result<Option<String>, ShaderError> {
        let Some(dir) = &self.override_dir else {
            return Ok(None);
        };
        let path = dir.join(kind.file_name());
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|source| ShaderError::Read { path, source })
    }

    /// Current source for `kind`
    pub fn source(&self, kind: ShaderKind) -> Cow<'static, str> {
        match self.read_override(kind) {
            Ok(Some(source)) => {
                log::debug!("Loaded {} from override directory", kind.file_name());
                Cow::Owned(source)
            }
            Ok(None) => Cow::Borrowed(kind.embedded()),
            Err(e) => {
                log::warn!("{}, using the embedded shader", e);
                Cow::Borrowed(kind.embedded())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "raytrace-viewer-{}-{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn embedded_sources_have_both_entry_points() {
        for kind in [ShaderKind::Raytracing, ShaderKind::Composite] {
            let source = ShaderLibrary::embedded().source(kind);
            assert!(source.contains("fn vs_main"));
            assert!(source.contains("fn fs_main"));
        }
    }

    #[test]
    fn override_file_wins() {
        let dir = scratch_dir("override");
        std::fs::write(dir.join("composite.wgsl"), "// custom").unwrap();

        let library = ShaderLibrary::with_override_dir(&dir);
        assert_eq!(library.source(ShaderKind::Composite), "// custom");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_override_falls_back_to_embedded() {
        let dir = scratch_dir("missing");
        let library = ShaderLibrary::with_override_dir(&dir);

        assert!(matches!(
            library.read_override(ShaderKind::Raytracing),
            Err(ShaderError::Read { .. })
        ));
        assert_eq!(library.source(ShaderKind::Raytracing), RAYTRACING_SHADER);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}

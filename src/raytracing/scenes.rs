use std::fs;
use std::path::Path;

use thiserror::Error;

use super::parser::{ImageData, ParserError, SceneParser};

const HOUSES: &str = include_str!("../../scenes/houses.txt");

#[derive(Error, Debug)]
pub enum SceneLoadError {
    #[error("file could not be opened: {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scene {path}: {source}")]
    Parse {
        path: String,
        content: String,
        #[source]
        source: ParserError,
    },
}

impl SceneLoadError {
    /// Echoes the offending line of the scene file, if the error points inside it.
    pub fn print_error_location(&self) {
        if let SceneLoadError::Parse {
            content, source, ..
        } = self
        {
            source.print_error_location(content);
        }
    }
}

/// Parses a scene description held in memory.
pub fn parse_scene(content: &str) -> Result<ImageData, ParserError> {
    let data = SceneParser::new(content).parse_scene()?;
    log::info!(
        "scene {}x{} with {} objects, {} lights, max depth {}",
        data.width(),
        data.height(),
        data.scene.objects.len(),
        data.scene.lights.len(),
        data.max_depth
    );
    log::debug!("camera {:?}", data.camera);
    Ok(data)
}

/// Reads and parses the scene file at `path`.
pub fn load_scene(path: impl AsRef<Path>) -> Result<ImageData, SceneLoadError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| SceneLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_scene(&content).map_err(|source| SceneLoadError::Parse {
        path: path.display().to_string(),
        content,
        source,
    })
}

/// Built-in scene: a meadow with two small houses and a river running in front of them.
pub fn houses() -> Result<ImageData, ParserError> {
    parse_scene(HOUSES)
}

//! Error types for scene loading, model preprocessing and model decoding.
//!
//! Scene parsing itself never fails on content: malformed lines and bad numbers
//! are reported as [`Diagnostic`](crate::scene::Diagnostic)s instead. The errors
//! here cover the filesystem and the model decoder.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading a scene description from disk.
#[derive(Error, Debug)]
pub enum SceneError {
    /// The scene file could not be opened or read.
    #[error("failed to read scene '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the model preprocessing cache.
#[derive(Error, Debug)]
pub enum ModelCacheError {
    /// Checking whether the cache file exists failed for a reason other than
    /// the file being absent (permissions, broken mount, ...).
    #[error("failed to probe cache file '{path}': {source}")]
    Probe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source model could not be opened.
    #[error("failed to open model source '{path}': {source}")]
    OpenSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache file could not be created, filled or moved into place.
    #[error("failed to build cache file '{path}': {source}")]
    WriteCache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ModelCacheError {
    pub(crate) fn probe(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Probe {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn open_source(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OpenSource {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write_cache(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteCache {
            path: path.into(),
            source,
        }
    }
}

/// Errors reported by a [`ModelDecoder`](crate::assets::ModelDecoder).
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The OBJ loader rejected the file. The loader's own message is kept as is.
    #[error("failed to decode model '{path}': {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    /// Any other decoder failure.
    #[error("failed to decode model '{path}': {message}")]
    Other { path: PathBuf, message: String },
}

/// Why a single room object could not be placed.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error(transparent)]
    Cache(#[from] ModelCacheError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

//! Track manifest and file discovery for the `tagdir` binary.
//!
//! The manifest is an XML file listing tags per track, with paths relative to
//! the reorganized root:
//!
//! ```xml
//! <tracks>
//!   <track path="Nirvana - Nevermind/01 Smells Like Teen Spirit.flac">
//!     <tag name="artist">Nirvana</tag>
//!     <tag name="album">Nevermind</tag>
//!   </track>
//! </tracks>
//! ```

use anyhow::{Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::rename::{Expansion, MetadataSource, TrackFile};
use crate::template::{self, Tags};

/// File extensions treated as audio tracks (lower-case).
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "opus", "m4a", "mp4", "aac", "wav", "wv", "ape", "mpc", "aif", "aiff",
    "wma", "spx", "tta", "dsf",
];

#[derive(Debug, Deserialize)]
#[serde(rename = "tracks")]
struct XmlTracks {
    #[serde(rename = "track", default)]
    tracks: Vec<XmlTrack>,
}

#[derive(Debug, Deserialize)]
struct XmlTrack {
    #[serde(rename = "@path")]
    path: String,
    #[serde(rename = "tag", default)]
    tags: Vec<XmlTag>,
}

#[derive(Debug, Deserialize)]
struct XmlTag {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "$text", default)]
    value: String,
}

/// Tags for every track of a manifest, keyed by absolute path.
#[derive(Debug, Default, Clone)]
pub struct TagTable {
    tracks: HashMap<PathBuf, Tags>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse manifest XML; relative track paths are joined onto `root`.
    pub fn from_xml(xml: &str, root: &Path) -> Result<Self> {
        let parsed: XmlTracks = from_xml_str(xml).context("parse track manifest")?;
        let mut table = Self::new();
        for track in parsed.tracks {
            let path = root.join(track.path.trim());
            let tags: Tags = track
                .tags
                .into_iter()
                .map(|t| (t.name.trim().to_ascii_lowercase(), t.value.trim().to_string()))
                .collect();
            if table.tracks.insert(path.clone(), tags).is_some() {
                warn!(path = %path.display(), "track listed twice in manifest; last entry wins");
            }
        }
        debug!(tracks = table.len(), "loaded track manifest");
        Ok(table)
    }

    pub fn load(path: &Path, root: &Path) -> Result<Self> {
        let xml = fs::read_to_string(path)
            .with_context(|| format!("read track manifest '{}'", path.display()))?;
        Self::from_xml(&xml, root).with_context(|| format!("load track manifest '{}'", path.display()))
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, tags: Tags) {
        self.tracks.insert(path.into(), tags);
    }

    pub fn tags(&self, path: &Path) -> Option<&Tags> {
        self.tracks.get(path)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl MetadataSource for TagTable {
    fn expand(&self, file: &TrackFile, template: &str) -> Option<Expansion> {
        template::expand(template, self.tags(file.path())?)
    }
}

fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Audio files below `root` in sorted directory-tree order.
/// Unreadable entries are logged and skipped.
pub fn scan_tracks(root: &Path) -> Vec<TrackFile> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_audio(e.path()))
        .map(|e| TrackFile::new(e.into_path()))
        .collect()
}

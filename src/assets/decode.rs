use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{PaperdollError, PaperdollResult};
use crate::foundation::math::hash_str;

/// A decoded body-part drawing, ready to be rasterized under any affine transform.
#[derive(Clone)]
pub struct VectorAsset {
    tree: Arc<usvg::Tree>,
    width: f64,
    height: f64,
    content_id: u64,
}

impl std::fmt::Debug for VectorAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorAsset")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("content_id", &format_args!("{:016x}", self.content_id))
            .finish()
    }
}

impl VectorAsset {
    pub fn tree(&self) -> &usvg::Tree {
        &self.tree
    }

    /// Intrinsic width in pixels.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Intrinsic height in pixels.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Stable hash of the source text this asset was decoded from.
    pub fn content_id(&self) -> u64 {
        self.content_id
    }
}

/// Parse an SVG source string into a [`VectorAsset`].
///
/// Parser state (options, font database, XML tree) lives only for the duration of the call.
pub fn decode_svg(source: &str) -> PaperdollResult<VectorAsset> {
    if source.trim().is_empty() {
        return Err(PaperdollError::decode("vector source is empty"));
    }

    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(source.as_bytes(), &opts)
        .map_err(|e| PaperdollError::decode(format!("parse svg tree: {e}")))?;

    let size = tree.size();
    let (width, height) = (f64::from(size.width()), f64::from(size.height()));
    if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
        return Err(PaperdollError::decode(format!(
            "svg has invalid intrinsic size {width}x{height}"
        )));
    }

    Ok(VectorAsset {
        tree: Arc::new(tree),
        width,
        height,
        content_id: hash_str(source),
    })
}

/// Part name to SVG source, as exported by the sketch canvases.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct VectorAssetSet {
    sources: BTreeMap<String, String>,
}

impl VectorAssetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(s: &str) -> PaperdollResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| PaperdollError::serde(format!("invalid vector asset set: {e}")))
    }

    pub fn from_path(path: &Path) -> PaperdollResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read vector asset set '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn insert(&mut self, part: impl Into<String>, source: impl Into<String>) -> &mut Self {
        self.sources.insert(part.into(), source.into());
        self
    }

    /// Drop one part's drawing (the sketch canvas was cleared).
    pub fn remove(&mut self, part: &str) -> Option<String> {
        self.sources.remove(part)
    }

    pub fn get(&self, part: &str) -> Option<&str> {
        self.sources.get(part).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sources
            .iter()
            .map(|(part, source)| (part.as_str(), source.as_str()))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;

//! Label font loading for wasm32.
//!
//! - Fetch TrueType/OpenType bytes over HTTP with `gloo-net`
//! - Validate the sfnt header before handing bytes to csgrs
//! - Turn a string into extruded, centered 3D text geometry
//!
//! Notes
//! -----
//! * The font is fetched once per viewer; the viewer keeps one label mesh per text.
//! * Nothing is cached between page loads.

use crate::config::LabelConfig;
use crate::error::ViewerError;
use crate::geometry::Geometry;
use csgrs::sketch::Sketch;
use std::sync::Arc;

#[cfg(target_arch = "wasm32")]
use gloo_net::http::Request;

/// sfnt version tags accepted as font data.
const SFNT_TAGS: [[u8; 4]; 4] = [[0x00, 0x01, 0x00, 0x00], *b"true", *b"OTTO", *b"ttcf"];

#[derive(Debug, Clone)]
pub struct Font {
    pub family: String,
    bytes: Arc<[u8]>,
}

impl Font {
    pub fn from_bytes(family: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ViewerError> {
        let family = family.into();
        let Some(tag) = bytes.get(..4) else {
            return Err(ViewerError::Font(format!("{family}: truncated font data")));
        };
        if !SFNT_TAGS.iter().any(|t| t == tag) {
            return Err(ViewerError::Font(format!("{family}: not a TrueType/OpenType font")));
        }
        Ok(Self { family, bytes: bytes.into() })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Extruded text, centered on the origin.
    pub fn label_geometry(&self, text: &str, cfg: &LabelConfig) -> Result<Geometry, ViewerError> {
        let sketch = Sketch::<()>::text(text, &self.bytes, cfg.size.into(), None);
        let geometry = Geometry::from_csg(&sketch.extrude(cfg.depth.into()));
        if geometry.is_empty() {
            return Err(ViewerError::Font(format!("{}: no glyphs for {text:?}", self.family)));
        }
        Ok(geometry.centered())
    }
}

/// Family name guessed from the file part of a font URL.
///
/// `"./fonts/helvetiker_regular.ttf"` → `"helvetiker_regular"`
pub fn family_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let file = path.rsplit('/').next().unwrap_or_default();
    let stem = file.split_once('.').map_or(file, |(stem, _)| stem);
    if stem.is_empty() { "font".to_owned() } else { stem.to_owned() }
}

/// Download and validate the label font.
#[cfg(target_arch = "wasm32")]
pub async fn fetch_font(url: &str) -> Result<Font, ViewerError> {
    let resp = Request::get(url).send().await.map_err(to_font_err)?;
    if !resp.ok() {
        return Err(ViewerError::Font(format!("GET {url} returned {}", resp.status())));
    }
    let bytes = resp.binary().await.map_err(to_font_err)?;
    log::debug!("fetched font {url} ({} bytes)", bytes.len());
    Font::from_bytes(family_from_url(url), bytes)
}

#[cfg(target_arch = "wasm32")]
fn to_font_err<E: core::fmt::Display>(e: E) -> ViewerError {
    ViewerError::Font(e.to_string())
}

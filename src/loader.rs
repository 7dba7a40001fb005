// glTF 2.0 importer: decodes GLB or self-contained .gltf bytes into a Model.
// Only the first root node of the default scene is taken, with its whole
// subtree; node transforms are baked into the vertices.

use crate::error::ViewerError;
use crate::geometry::Geometry;
use crate::scene::Model;
use anyhow::Context as _;
use gltf::mesh::Mode;
use nalgebra::Matrix4;

pub fn import_model(bytes: &[u8]) -> Result<Model, ViewerError> {
    let parts = decode_parts(bytes)?;
    if parts.is_empty() {
        return Err(ViewerError::EmptyModel);
    }
    Ok(Model::from_parts(parts))
}

fn decode_parts(bytes: &[u8]) -> anyhow::Result<Vec<Geometry>> {
    let (doc, buffers, _images) = gltf::import_slice(bytes).context("invalid glTF data")?;

    let scene = doc
        .default_scene()
        .or_else(|| doc.scenes().next())
        .context("glTF has no scene")?;
    let root = scene.nodes().next().context("glTF scene has no nodes")?;

    let mut parts = Vec::new();
    collect(&root, &Matrix4::identity(), &buffers, &mut parts);
    Ok(parts)
}

fn collect(node: &gltf::Node, parent: &Matrix4<f32>, buffers: &[gltf::buffer::Data], out: &mut Vec<Geometry>) {
    let local = Matrix4::from(node.transform().matrix());
    let world = parent * local;

    if let Some(mesh) = node.mesh() {
        for prim in mesh.primitives() {
            if prim.mode() != Mode::Triangles {
                log::debug!("skipping {:?} primitive in mesh {:?}", prim.mode(), mesh.name());
                continue;
            }
            let reader = prim.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

            let Some(positions) = reader.read_positions() else { continue };
            let positions: Vec<[f32; 3]> = positions.collect();
            let normals: Vec<[f32; 3]> = reader.read_normals().map(|n| n.collect()).unwrap_or_default();
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            if indices.len() < 3 {
                continue;
            }

            let geometry = Geometry::new(positions, normals, indices);
            out.push(if world == Matrix4::identity() { geometry } else { geometry.transformed(&world) });
        }
    }

    for child in node.children() {
        collect(&child, &world, buffers, out);
    }
}

/// The upload input files are picked from.
pub trait FileInput {
    type File;

    /// First selected file, if any.
    fn selected(&self) -> Option<Self::File>;

    /// Clears the selection so picking the same file again fires another change.
    fn reset(&self);
}

/// Takes the picked file and clears the input. Nothing picked is a no-op.
pub fn take_selected<I: FileInput>(input: &I) -> Option<I::File> {
    let file = input.selected()?;
    input.reset();
    Some(file)
}

#[cfg(target_arch = "wasm32")]
impl FileInput for web_sys::HtmlInputElement {
    type File = web_sys::File;

    fn selected(&self) -> Option<web_sys::File> {
        self.files().and_then(|files| files.get(0))
    }

    fn reset(&self) {
        self.set_value("");
    }
}

/// A `blob:` URL for a picked file, revoked when dropped.
#[cfg(target_arch = "wasm32")]
pub struct ObjectUrl(String);

#[cfg(target_arch = "wasm32")]
impl ObjectUrl {
    pub fn new(blob: &web_sys::Blob) -> Result<Self, ViewerError> {
        Ok(Self(web_sys::Url::create_object_url_with_blob(blob)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(target_arch = "wasm32")]
impl Drop for ObjectUrl {
    fn drop(&mut self) {
        if let Err(e) = web_sys::Url::revoke_object_url(&self.0) {
            log::warn!("could not revoke {}: {e:?}", self.0);
        }
    }
}

/// Reads a picked file through a temporary object URL and decodes it.
/// The URL is released before decoding starts, whether the read worked or not.
#[cfg(target_arch = "wasm32")]
pub async fn load_file(file: &web_sys::File) -> Result<Model, ViewerError> {
    let bytes = {
        let url = ObjectUrl::new(file)?;
        let resp = gloo_net::http::Request::get(url.as_str())
            .send()
            .await
            .map_err(|e| ViewerError::ModelDecode(e.to_string()))?;
        resp.binary().await.map_err(|e| ViewerError::ModelDecode(e.to_string()))?
    };
    log::debug!("read {} ({} bytes)", file.name(), bytes.len());
    import_model(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use std::cell::{Cell, RefCell};

    /// Base64 data URI of one triangle: 3 VEC3 positions followed by 3 u16 indices.
    fn triangle_gltf(translation: [f32; 3]) -> String {
        let mut buf = Vec::new();
        for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in v {
                buf.extend_from_slice(&c.to_le_bytes());
            }
        }
        for i in [0u16, 1, 2] {
            buf.extend_from_slice(&i.to_le_bytes());
        }
        buf.extend_from_slice(&[0, 0]);
        let data = STANDARD.encode(&buf);

        format!(
            r#"{{
              "asset": {{ "version": "2.0" }},
              "scene": 0,
              "scenes": [{{ "nodes": [0] }}],
              "nodes": [{{ "mesh": 0, "translation": [{}, {}, {}] }}],
              "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1 }}] }}],
              "buffers": [{{ "byteLength": {len}, "uri": "data:application/octet-stream;base64,{data}" }}],
              "bufferViews": [
                {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
                {{ "buffer": 0, "byteOffset": 36, "byteLength": 6 }}
              ],
              "accessors": [
                {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                   "min": [0, 0, 0], "max": [1, 1, 0] }},
                {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
              ]
            }}"#,
            translation[0],
            translation[1],
            translation[2],
            len = buf.len(),
        )
    }

    #[test]
    fn decodes_embedded_gltf_and_bakes_transform() {
        let model = import_model(triangle_gltf([0.0, 0.0, 5.0]).as_bytes()).unwrap();
        assert_eq!(model.parts().len(), 1);
        let g = &model.parts()[0];
        assert_eq!(g.triangle_count(), 1);
        assert_relative_eq!(g.positions()[1][0], 1.0);
        assert_relative_eq!(g.positions()[1][2], 5.0);
        // normals computed since the file has none
        assert_relative_eq!(g.normals()[0][2], 1.0, epsilon = 1e-6);
    }

    /// File input holding a list of picked names.
    #[derive(Default)]
    struct Picker {
        files: RefCell<Vec<&'static str>>,
        resets: Cell<usize>,
    }

    impl FileInput for Picker {
        type File = &'static str;

        fn selected(&self) -> Option<&'static str> {
            self.files.borrow().first().copied()
        }

        fn reset(&self) {
            self.files.borrow_mut().clear();
            self.resets.set(self.resets.get() + 1);
        }
    }

    #[test]
    fn nothing_picked_is_a_no_op() {
        let picker = Picker::default();
        assert_eq!(take_selected(&picker), None);
        assert_eq!(picker.resets.get(), 0);
    }

    #[test]
    fn picking_clears_input_for_the_next_pick() {
        let picker = Picker::default();
        picker.files.borrow_mut().push("duck.glb");
        assert_eq!(take_selected(&picker), Some("duck.glb"));
        assert_eq!(picker.resets.get(), 1);
        assert_eq!(take_selected(&picker), None);

        picker.files.borrow_mut().push("duck.glb");
        assert_eq!(take_selected(&picker), Some("duck.glb"));
        assert_eq!(picker.resets.get(), 2);
    }

    #[test]
    fn non_triangle_primitives_are_skipped() {
        let gltf = triangle_gltf([0.0; 3]).replace(
            r#""meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] }]"#,
            r#""meshes": [{ "name": "mixed", "primitives": [
                { "attributes": { "POSITION": 0 }, "mode": 0 },
                { "attributes": { "POSITION": 0 }, "indices": 1 }
            ] }]"#,
        );
        assert!(gltf.contains("mixed"));
        let model = import_model(gltf.as_bytes()).unwrap();
        assert_eq!(model.parts().len(), 1);
        assert_eq!(model.triangle_count(), 1);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = import_model(b"definitely not a model").unwrap_err();
        assert!(matches!(err, ViewerError::ModelDecode(_)), "{err:?}");
    }

    #[test]
    fn scene_without_meshes_is_empty_model() {
        let json = r#"{ "asset": { "version": "2.0" }, "scene": 0, "scenes": [{ "nodes": [0] }], "nodes": [{}] }"#;
        assert_eq!(import_model(json.as_bytes()).unwrap_err(), ViewerError::EmptyModel);
    }
}

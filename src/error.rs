use thiserror::Error;

/// Everything that can go wrong while building the page or feeding the viewer.
///
/// Only `MissingMount` is fatal; the rest are reported to the user through the
/// alert region or the log and the render loop keeps going.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ViewerError {
    #[error("missing required mount point `{0}`")]
    MissingMount(String),

    #[error("could not decode model: {0}")]
    ModelDecode(String),

    #[error("model contains no triangle meshes")]
    EmptyModel,

    #[error("font unavailable: {0}")]
    Font(String),

    #[error("browser call failed: {0}")]
    Js(String),
}

impl From<anyhow::Error> for ViewerError {
    fn from(err: anyhow::Error) -> Self {
        ViewerError::ModelDecode(format!("{err:#}"))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for ViewerError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        ViewerError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<ViewerError> for wasm_bindgen::JsValue {
    fn from(err: ViewerError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

//! The viewer page: canvas, navigation controls, alert region and upload form.

use crate::control::ControlProps;

pub const PAGE_CLASS: &str = "object-viewer-page";

/// Static inner markup of the page. Controls are appended to `.controls`
/// after it is inserted.
pub fn page_markup() -> &'static str {
    r#"<canvas class="viewer__canvas" aria-label="Canvas for 3D visualization"></canvas>
<div>
  <div class="controls" aria-labelledby="controls__title"></div>
  <div class="alert" aria-live="polite">
    <div class="alert__wrapper">
      <h2 class="alert__title"></h2>
      <button class="alert__button" aria-label="Close alert">Close</button>
    </div>
  </div>
  <form class="upload">
    <label for="upload__file" class="upload__label">Browse a Model</label>
    <input type="file" id="upload__file" class="upload__input" hidden accept=".glb,.gltf" />
  </form>
</div>"#
}

/// Left then right arrow control.
pub fn navigation_controls(arrow_image: &str) -> [ControlProps; 2] {
    [
        ControlProps::new("Left", arrow_image).with_class("control--left"),
        ControlProps::new("Right", arrow_image).with_class("control--right"),
    ]
}

pub(crate) fn missing_mount(mount_id: &str) -> crate::error::ViewerError {
    crate::error::ViewerError::MissingMount(format!("#{mount_id}"))
}

#[cfg(target_arch = "wasm32")]
pub use self::dom::ObjectViewerPage;

#[cfg(target_arch = "wasm32")]
mod dom {
    use super::*;
    use crate::config::ViewerConfig;
    use crate::control::control;
    use crate::error::ViewerError;
    use crate::web::Viewer;
    use web_sys::Element;

    /// A mounted page with its viewer.
    pub struct ObjectViewerPage {
        root: Element,
        viewer: Viewer,
    }

    impl ObjectViewerPage {
        /// Builds the page, appends it to `#{config.mount_id}` and starts the viewer.
        pub fn mount(config: ViewerConfig) -> Result<Self, ViewerError> {
            let document = web_sys::window()
                .and_then(|w| w.document())
                .ok_or_else(|| ViewerError::MissingMount("document".into()))?;
            let mount = document.get_element_by_id(&config.mount_id).ok_or_else(|| missing_mount(&config.mount_id))?;

            let root = document.create_element("main")?;
            root.set_class_name(PAGE_CLASS);
            root.set_inner_html(page_markup());

            if let Some(controls) = root.query_selector(".controls")? {
                for props in navigation_controls(&config.arrow_image) {
                    controls.append_child(&control(&document, &props)?)?;
                }
            }
            mount.append_child(&root)?;

            let viewer = Viewer::start(&root, config)?;
            Ok(Self { root, viewer })
        }

        pub fn root(&self) -> &Element {
            &self.root
        }

        pub fn cleanup(&mut self) {
            self.viewer.dispose();
        }
    }
}

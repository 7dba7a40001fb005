/// Inputs of a navigation control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlProps {
    pub src_img: String,
    pub label: String,
    /// Extra class added next to `control`.
    pub class_name: Option<String>,
}

impl ControlProps {
    pub fn new(label: impl Into<String>, src_img: impl Into<String>) -> Self {
        Self { src_img: src_img.into(), label: label.into(), class_name: None }
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Id of the image: the label in lowercase.
    pub fn image_id(&self) -> String {
        self.label.to_lowercase()
    }

    pub fn class_list(&self) -> String {
        match self.class_name.as_deref() {
            Some(extra) if !extra.is_empty() => format!("control {extra}"),
            _ => "control".to_owned(),
        }
    }
}

/// Inner markup of a control: a label heading and the image.
pub fn control_markup(props: &ControlProps) -> String {
    format!(
        r#"<h2 class="control__label">{label}</h2><img src="{src}" id="{id}" alt="{label}" class="control__image" />"#,
        label = escape(&props.label),
        src = escape(&props.src_img),
        id = escape(&props.image_id()),
    )
}

pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Builds the `div.control` element.
#[cfg(target_arch = "wasm32")]
pub fn control(document: &web_sys::Document, props: &ControlProps) -> Result<web_sys::Element, crate::error::ViewerError> {
    let root = document.create_element("div")?;
    root.set_class_name(&props.class_list());
    root.set_inner_html(&control_markup(props));
    Ok(root)
}

//! The single shared message region. No queue: a new message replaces the
//! current one, open or not.

/// Where the alert is actually shown. The page implements this over the
/// `.alert` / `.alert__title` elements.
pub trait AlertSurface {
    fn show(&self, message: &str);
    fn hide(&self);
}

/// Surface that renders nothing, for headless use.
#[derive(Debug, Default)]
pub struct NoSurface;

impl AlertSurface for NoSurface {
    fn show(&self, _message: &str) {}
    fn hide(&self) {}
}

pub struct Alert {
    surface: Box<dyn AlertSurface>,
    message: String,
    visible: bool,
}

impl Alert {
    pub fn new(surface: Box<dyn AlertSurface>) -> Self {
        Self { surface, message: String::new(), visible: false }
    }

    pub fn open(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.visible = true;
        self.surface.show(&self.message);
    }

    pub fn close(&mut self) {
        self.visible = false;
        self.surface.hide();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Debug for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alert").field("message", &self.message).field("visible", &self.visible).finish()
    }
}

use log::debug;

/// Host window surface, as far as the rest of the app needs one.
pub trait HostWindow: Send + Sync {
    fn bring_to_front(&self);
}

/// Headless stand-in used when no window system is attached.
pub struct NoWindow;

impl HostWindow for NoWindow {
    fn bring_to_front(&self) {
        debug!("No window to bring to front");
    }
}

//! Browser window helpers used by the explorer host glue.
//!
//! Every accessor returns `None` (or does nothing) outside a window context,
//! e.g. in a worker.

use web_sys::{Storage, Window};

/// Get the browser window object.
#[inline]
pub fn window() -> Option<Window> {
    web_sys::window()
}

/// Get sessionStorage.
#[inline]
pub fn session_storage() -> Option<Storage> {
    window()?.session_storage().ok()?
}

/// Inner height of the window in CSS pixels, used to size listing pages.
pub fn viewport_height() -> Option<f64> {
    window()?.inner_height().ok()?.as_f64()
}

/// Vertical scroll offset of the window in CSS pixels.
pub fn scroll_offset() -> Option<f64> {
    window()?.scroll_y().ok()
}

/// Restore a vertical scroll offset.
pub fn scroll_to(offset: f64) {
    if let Some(window) = window() {
        window.scroll_to_with_x_and_y(0.0, offset);
    }
}

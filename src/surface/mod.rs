//! Rendering surface interfaces for playerview
//!
//! The surface is owned by the host window system. The view only reads its
//! geometry, toggles the keep-alive flag, and lets the engine attach its
//! video output to it. It never destroys a surface.

/// Width/height pair in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Return the same dimensions with the axes exchanged
    pub fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Device orientation as reported by the host configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Undefined,
    Portrait,
    Landscape,
}

/// Rendering target provided by the window system
pub trait Surface: Send + Sync {
    /// Current size of the surface view
    fn size(&self) -> Dimensions;

    /// Current size of the root view hosting the surface
    fn root_view_size(&self) -> Dimensions;

    /// Keep the display awake while video is playing
    fn set_keep_screen_on(&self, keep_on: bool);

    /// Whether the display is currently kept awake
    fn keep_screen_on(&self) -> bool;
}

/// Receiver of surface lifecycle notifications
pub trait SurfaceObserver {
    /// The surface became available for rendering
    fn on_surface_created(&self);

    /// The surface changed size
    fn on_surface_changed(&self, width: u32, height: u32);

    /// The surface is about to go away
    fn on_surface_destroyed(&self);
}

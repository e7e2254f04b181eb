//! The presentation surface the render loop draws into.

/// A window (or stand-in) that owns the default framebuffer.
///
/// The render loop only polls it, asks whether it should stop, and presents frames; it never
/// sees native window events.
pub trait Surface {
    /// Drains pending window-system events.
    fn poll_events(&mut self);

    /// Returns `true` once the user (or the platform) asked the surface to close.
    fn should_close(&self) -> bool;

    /// Presents the frame that was just drawn.
    fn swap_buffers(&mut self);

    /// Current drawable size in pixels.
    fn framebuffer_size(&self) -> (u32, u32);
}

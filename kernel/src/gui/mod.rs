//! Marker module for the optional 320x200 graphics/windowing layer the
//! purpose-and-scope section names. No implementation is wired into the
//! boot path; this documents the seam an implementer would fill in.

/// A pixel-addressable display mode, switchable away from and back to VGA
/// text mode. No type in this kernel implements it yet.
pub trait GraphicsDevice {
    fn set_pixel(&mut self, x: u16, y: u16, color: u8);
    fn clear(&mut self, color: u8);
    fn set_mode(&mut self, graphics: bool);
}

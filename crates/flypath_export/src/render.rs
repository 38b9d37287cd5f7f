// SPDX-License-Identifier: MIT OR Apache-2.0
//! Off-screen rendering hooks used during export.

use std::io::Cursor;

use flypath_timeline::Viewer;
use image::{ImageFormat, RgbaImage};

/// A viewer that can render and capture frames for export
pub trait RenderViewer: Viewer {
    /// Draw the scene with the current camera pose
    fn render(&mut self);

    /// Read back the last rendered frame
    fn capture(&mut self) -> RgbaImage;

    /// Current output size in pixels
    fn output_size(&self) -> (u32, u32);

    /// Resize the output, updating the camera aspect ratio
    fn set_output_size(&mut self, width: u32, height: u32);

    /// Whether path markers and gizmos are drawn
    fn overlays_visible(&self) -> bool;

    /// Show or hide path markers and gizmos
    fn set_overlays_visible(&mut self, visible: bool);
}

/// Encode a captured frame as PNG
pub fn encode_png(frame: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    frame.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

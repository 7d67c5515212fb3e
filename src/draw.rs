// Window + input polling for the demo binary.
// Visual effects provided here:
// 1) A window that shows the surface composite.
// 2) Mouse position / button state used as the stroke input source.
// 3) One-shot key presses for clear, auto spiral and export.

use freehand_surface::Error;
use image::RgbaImage;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

pub struct Drawer {
    window: Window,    // the on-screen window you see
    pixels: Vec<u32>,  // reused 0x00RRGGBB staging buffer for minifb
}

impl Drawer {
    /// Create a window sized to the surface raster.
    /// Visual: a new empty window appears with your chosen title.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(60);
        Ok(Self { window, pixels: Vec::with_capacity(width * height) })
    }

    /// Push an opaque composite to the screen.
    /// Visual: the window immediately shows the new drawing.
    pub fn present(&mut self, image: &RgbaImage) -> Result<(), Error> {
        let (w, h) = image.dimensions();
        self.pixels.clear();
        self.pixels.extend(image.pixels().map(|p| {
            // Each `p` is RGBA<u8> with alpha 255. We pack it as 0x00RRGGBB.
            ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32
        }));
        self.window
            .update_with_buffer(&self.pixels, w as usize, h as usize)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    /// Pump window events without repainting (nothing changed this frame).
    pub fn idle(&mut self) {
        self.window.update();
    }

    pub fn set_title(&mut self, title: &str) {
        self.window.set_title(title);
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// Mouse position in window pixels, or None when outside the window.
    pub fn mouse_pos(&self) -> Option<(f32, f32)> {
        self.window.get_mouse_pos(MouseMode::Discard)
    }

    /// Visual: while true, the live stroke follows the cursor.
    pub fn left_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Left)
    }

    /// Visual: when pressed, the whole drawing disappears.
    pub fn c_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::C, KeyRepeat::No)
    }

    /// Visual: when pressed, a spiral starts drawing itself from the center.
    pub fn a_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::A, KeyRepeat::No)
    }

    // writes snapshot.png next to the binary's working dir
    pub fn s_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::S, KeyRepeat::No)
    }
}

// What you SEE:
// • Hold Left Mouse and move: a live stroke follows the cursor.
// • Release: the stroke is flattened into the raster layer.
// • A draws a spiral by itself (grab the mouse to interrupt it).
// • C clears everything. S saves snapshot.png. ESC quits.
//
// Set RUST_LOG=debug to watch flattens happen.

mod draw;

use draw::Drawer;
use freehand_surface::{
    AutoState, AutoStroke, DrawSurface, Error, ExportOptions, ExportScale, Point, SpiralParams,
    StyleState, SurfaceConfig,
};
use image::Rgba;
use log::{info, trace, warn};
use std::time::{Duration, Instant};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const SCALE: f32 = 1.0;
const LINE_WIDTH: f32 = 4.0;
const INK: Rgba<u8> = Rgba([24, 24, 32, 255]);
const SNAPSHOT_PATH: &str = "snapshot.png";

fn main() -> Result<(), Error> {
    env_logger::init();

    /* --- Surface + window setup ---
       Visual: an empty white window the size of the surface raster. */
    let config = SurfaceConfig { opaque: true, ..SurfaceConfig::new(WIDTH, HEIGHT, SCALE) };
    let mut surface = DrawSurface::with_style(config, StyleState::new(LINE_WIDTH, INK))?;
    let (pw, ph) = surface.bounds().pixel_size();
    let mut drawer = Drawer::new("Freehand", pw as usize, ph as usize)?;

    // What the window shows: opaque composite at raster resolution.
    let screen = ExportOptions { opaque: true, scale: ExportScale::Native };

    let mut auto: Option<AutoStroke> = None;
    let mut was_down = false;
    let mut last_point: Option<Point> = None;
    let mut first_frame = true;

    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        /* 1) Keys */
        if drawer.c_pressed_once() {
            if let Some(mut a) = auto.take() {
                if let Err(e) = a.cancel(&mut surface) {
                    warn!("could not finish auto stroke: {e}");
                }
            }
            surface.clear();
        }
        if drawer.a_pressed_once() && auto.is_none() {
            if let Err(e) = surface.end_stroke() {
                warn!("could not finish stroke: {e}");
            }
            auto = Some(AutoStroke::new(SpiralParams::centered(surface.bounds())));
        }
        if drawer.s_pressed_once() {
            let image = surface.image_representation(&ExportOptions { opaque: true, scale: ExportScale::Unit });
            image.save(SNAPSHOT_PATH)?;
            info!("saved {SNAPSHOT_PATH}");
        }

        /* 2) Mouse stroke. Real input wins over the auto spiral. */
        let down = drawer.left_mouse_down();
        if down {
            if let Some(mut a) = auto.take() {
                if let Err(e) = a.cancel(&mut surface) {
                    warn!("could not finish auto stroke: {e}");
                }
            }
            if let Some((mx, my)) = drawer.mouse_pos() {
                let point = Point::new(mx / SCALE, my / SCALE);
                if last_point != Some(point) {
                    if let Err(e) = surface.begin_or_continue_stroke(point) {
                        warn!("overflow flatten failed, point kept live: {e}");
                    }
                    last_point = Some(point);
                }
            }
        } else if was_down {
            if let Err(e) = surface.end_stroke() {
                warn!("could not finish stroke: {e}");
            }
            last_point = None;
        }
        was_down = down;

        /* 3) Auto spiral: one point per frame */
        if let Some(a) = auto.as_mut() {
            match a.tick(&mut surface) {
                Ok(AutoState::Running) => {}
                Ok(_) => auto = None,
                Err(e) => warn!("auto stroke flatten failed, retrying next frame: {e}"),
            }
        }

        /* 4) Repaint only when the surface asked for it */
        match surface.take_redraw() {
            Some(dirty) => {
                trace!("redraw {dirty:?}");
                drawer.present(&surface.image_representation(&screen))?;
            }
            None if first_frame => drawer.present(&surface.image_representation(&screen))?,
            None => drawer.idle(),
        }
        first_frame = false;

        /* 5) FPS + status in the title once per second */
        frames_this_second += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let fps = frames_this_second as f32 / now.duration_since(last_fps_time).as_secs_f32();
            let status = format!(
                "Freehand | {:?} | live pts: {} | flattens: {} | FPS: {:.1}",
                surface.state(),
                surface.live_points().len(),
                surface.flatten_count(),
                fps
            );
            info!("{status}");
            drawer.set_title(&status);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    Ok(())
}

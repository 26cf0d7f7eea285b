pub mod camera;
pub mod geometry;
pub mod mesh;
pub mod scene;
pub mod stl;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use renderer::Device;
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;

use geometry::GeometryCache;
use scene::Scene;

#[derive(Parser, Debug)]
#[command(about = "Renders a binary STL model with fixed-function lighting")]
struct Args {
    /// Path to the binary STL model.
    #[arg(default_value = "model.stl")]
    model: PathBuf,

    /// Window width in windowed mode. Defaults to half the desktop.
    #[arg(long)]
    width: Option<u32>,

    /// Window height in windowed mode. Defaults to half the desktop.
    #[arg(long)]
    height: Option<u32>,

    /// Start in borderless fullscreen at desktop resolution.
    #[arg(long)]
    fullscreen: bool,

    /// Rescale the model to fit a two-unit cube around the origin.
    #[arg(long)]
    fit: bool,
}

fn main() {
    env_logger::init();
    if let Err(err) = run(Args::parse()) {
        log::error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut mesh = stl::load_binary_stl(&args.model)
        .with_context(|| format!("loading {}", args.model.display()))?;
    log::info!(
        "loaded {}: {} triangles",
        args.model.display(),
        mesh.triangle_count()
    );
    if args.fit {
        let fit = mesh.fit_transform(2.0);
        mesh.apply_transform(fit);
    }

    let sdl = sdl2::init().map_err(anyhow::Error::msg)?;
    let video = sdl.video().map_err(anyhow::Error::msg)?;
    let desktop = video.display_bounds(0).map_err(anyhow::Error::msg)?;
    let window_width = args.width.unwrap_or_else(|| (desktop.width() / 2).max(1));
    let window_height = args.height.unwrap_or_else(|| (desktop.height() / 2).max(1));
    let mut builder = video.window("STL playground", window_width, window_height);
    builder.position_centered().resizable();
    if args.fullscreen {
        builder.fullscreen_desktop();
    }
    let window = builder.build()?;

    let mut canvas = window.into_canvas().build()?;
    let (mut width, mut height) = canvas.output_size().map_err(anyhow::Error::msg)?;

    let texture_creator = canvas.texture_creator();
    let mut display =
        texture_creator.create_texture_streaming(PixelFormatEnum::RGBA32, width, height)?;
    let mut pixels = vec![0u8; (width * height * 4) as usize];

    let mut device = Device::new(width, height)?;
    let mut cache = GeometryCache::new();
    let scene = Scene::new(mesh);

    let mut event_pump = sdl.event_pump().map_err(anyhow::Error::msg)?;
    let mut timer = Instant::now();
    'running: loop {
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'running,
                Event::Window {
                    win_event: WindowEvent::SizeChanged(new_width, new_height),
                    ..
                } => {
                    width = new_width.max(1) as u32;
                    height = new_height.max(1) as u32;
                    device.resize(width, height)?;
                    display = texture_creator.create_texture_streaming(
                        PixelFormatEnum::RGBA32,
                        width,
                        height,
                    )?;
                    pixels.resize((width * height * 4) as usize, 0);
                }
                _ => {}
            }
        }

        let aspect = width as f32 / height as f32;
        scene.render(&mut device, &mut cache, aspect)?;
        log::trace!("frame times: {:?}", device.frame_time());

        for (index, color) in device.framebuffer().colors().enumerate() {
            pixels[index * 4] = (color.x * 255.0) as u8;
            pixels[index * 4 + 1] = (color.y * 255.0) as u8;
            pixels[index * 4 + 2] = (color.z * 255.0) as u8;
            pixels[index * 4 + 3] = 255;
        }
        display.update(None, &pixels, (width * 4) as usize)?;
        canvas.copy(&display, None, None).map_err(anyhow::Error::msg)?;
        canvas.present();

        let delta = timer.elapsed().as_secs_f32();
        timer = Instant::now();
        canvas
            .window_mut()
            .set_title(&format!("STL playground - {:.0} fps", 1.0 / delta))?;
    }

    Ok(())
}

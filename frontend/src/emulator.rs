use std::time::Instant;

use invaders_core::core::Machine;
use invaders_machine::SpaceInvadersCabinet;
use sdl2::event::Event;
use sdl2::keyboard::Scancode;

use crate::input::KeyMap;
use crate::overlay;
use crate::video::Video;

/// Run the cabinet in a wall-clock-paced loop: each tick feeds the elapsed
/// microseconds since start into [`SpaceInvadersCabinet::run_slice`], then
/// renders whatever frame is cached from the last interrupt-#2 boundary.
pub fn run(cabinet: &mut SpaceInvadersCabinet, key_map: &KeyMap, scale: u32) {
    let sdl_context = sdl2::init().expect("Failed to initialize SDL2");
    let sdl_video = sdl_context.video().expect("Failed to init SDL video");

    let (width, height) = cabinet.display_size();
    let mut video = Video::new(&sdl_video, "Space Invaders", width, height, scale);
    let mut event_pump = sdl_context.event_pump().expect("Failed to get event pump");

    let buffer_size = (width * height * 3) as usize;
    let mut framebuffer = vec![0u8; buffer_size];

    let start = Instant::now();
    let mut last_frame_at = Instant::now();

    'main: loop {
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => break 'main,

                Event::KeyDown {
                    scancode: Some(Scancode::Escape),
                    ..
                } => break 'main,

                Event::KeyDown {
                    scancode: Some(sc),
                    repeat: false,
                    ..
                } => {
                    if let Some(button_id) = key_map.get(sc) {
                        cabinet.set_input(button_id, true);
                    }
                }

                Event::KeyUp {
                    scancode: Some(sc), ..
                } => {
                    if let Some(button_id) = key_map.get(sc) {
                        cabinet.set_input(button_id, false);
                    }
                }

                _ => {}
            }
        }

        let now_us = start.elapsed().as_micros() as u64;
        cabinet.run_slice(now_us);

        cabinet.render_frame(&mut framebuffer);

        let frame_time = last_frame_at.elapsed();
        last_frame_at = Instant::now();
        if frame_time.as_secs_f64() > 0.0 {
            let fps = 1.0 / frame_time.as_secs_f64();
            overlay::draw_fps(&mut framebuffer, width as usize, &format!("{fps:.1}"));
        }

        video.present(&framebuffer);
    }
}

// main.rs — 地月系统演示：窗口、事件循环与 3D 交互

mod camera;
mod config;
mod error;
mod mesh;
mod renderer;
mod scene;
mod tangent;
mod texture;

use camera::Walk;
use config::AppConfig;
use error::{AppError, MeshError};
use mesh::{build_sphere, SphereMesh};
use renderer::{FrameUniforms, GpuMesh, Renderer};
use scene::{AppState, Command, FrameTransforms, Selection, USAGE};
use tangent::{build_tangent_space, TangentOptions};
use texture::{GpuTexture, TextureKind};

use glam::Vec2;
use winit::{
    dpi::LogicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use std::sync::Arc;
use std::time::Instant;

struct SceneMeshes {
    sky: GpuMesh,
    moon: GpuMesh,
    earth: GpuMesh,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let config = AppConfig::load(&args);

    if let Err(e) = run(config) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

/// Generates one sphere and its tangent frames.
fn make_sphere(
    name: &str,
    resolution: u32,
    options: &TangentOptions,
) -> Result<SphereMesh, MeshError> {
    let started = Instant::now();
    let mut mesh = build_sphere(resolution)?;
    let report = build_tangent_space(&mut mesh, options)?;

    log::info!(
        "{name} sphere: {} vertices, {} triangles ({:.1} ms)",
        mesh.point_count(),
        mesh.triangle_count(),
        started.elapsed().as_secs_f64() * 1000.0
    );
    if !report.is_clean() {
        log::debug!(
            "{name} sphere: {} tangent axes used the fallback",
            report.degenerate.len()
        );
    }
    Ok(mesh)
}

fn upload_spheres(renderer: &Renderer, config: &AppConfig) -> Result<SceneMeshes, MeshError> {
    let spheres = &config.spheres;
    let textures = &config.textures;
    let (device, queue) = (renderer.device(), renderer.queue());
    let load = |path: &std::path::Path, kind| GpuTexture::load_or_solid(device, queue, path, kind);

    let sky = make_sphere("sky", spheres.sky, &spheres.tangents)?;
    let moon = make_sphere("moon", spheres.moon, &spheres.tangents)?;
    let earth = make_sphere("earth", spheres.earth, &spheres.tangents)?;

    // CPU 端网格上传后即可释放
    Ok(SceneMeshes {
        sky: renderer.upload_mesh(
            "sky",
            &sky,
            &load(textures.sky.as_path(), TextureKind::Color),
            None,
            false,
        ),
        moon: renderer.upload_mesh(
            "moon",
            &moon,
            &load(textures.moon.as_path(), TextureKind::Color),
            Some(&load(textures.moon_normal.as_path(), TextureKind::NormalMap)),
            true,
        ),
        earth: renderer.upload_mesh(
            "earth",
            &earth,
            &load(textures.earth.as_path(), TextureKind::Color),
            Some(&load(textures.earth_normal.as_path(), TextureKind::NormalMap)),
            true,
        ),
    })
}

fn command_for(key: VirtualKeyCode) -> Option<Command> {
    match key {
        VirtualKeyCode::W => Some(Command::Walk(Walk::Forward)),
        VirtualKeyCode::S => Some(Command::Walk(Walk::Back)),
        VirtualKeyCode::A => Some(Command::Walk(Walk::Left)),
        VirtualKeyCode::D => Some(Command::Walk(Walk::Right)),
        VirtualKeyCode::R => Some(Command::ToggleRotation),
        VirtualKeyCode::O => Some(Command::OrbitFaster),
        VirtualKeyCode::P => Some(Command::OrbitSlower),
        VirtualKeyCode::M => Some(Command::ToggleMoonOnly),
        VirtualKeyCode::N => Some(Command::ToggleSky),
        _ => None,
    }
}

/// Visible meshes paired with their model matrices, sky first.
fn visible<'a>(
    meshes: &'a SceneMeshes,
    frame: &FrameTransforms,
) -> Vec<(&'a GpuMesh, glam::Mat4)> {
    let mut list = Vec::with_capacity(3);
    if let Some(sky) = frame.sky {
        list.push((&meshes.sky, sky));
    }
    if let Some(earth) = frame.earth {
        list.push((&meshes.earth, earth));
    }
    list.push((&meshes.moon, frame.moon));
    list
}

fn run(config: AppConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(&config.window.title)
            .with_inner_size(LogicalSize::new(config.window.width, config.window.height))
            .build(&event_loop)?,
    );

    let mut renderer = pollster::block_on(Renderer::new(window.clone(), config.window.vsync))?;
    let meshes = upload_spheres(&renderer, &config)?;
    let mut state = AppState::new(&config);
    state.set_scale_factor(window.scale_factor() as f32);

    log::info!("Usage:\n{USAGE}");

    let mut cursor = Vec2::ZERO;

    // FPS 计算
    let mut last_frame_time = Instant::now();
    let mut frame_count = 0;
    let mut fps = 0.0;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, .. } => {
                // 先让 egui 处理事件
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                let viewport = Vec2::new(renderer.size.width as f32, renderer.size.height as f32);

                // 左键松开即使被 egui 接管也要结束拖拽
                if let WindowEvent::MouseInput {
                    state: button_state,
                    button: MouseButton::Left,
                    ..
                } = &event
                {
                    let pressed = *button_state == ElementState::Pressed;
                    state.left_button(pressed, cursor, viewport, response.consumed);
                    return;
                }
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                    }

                    WindowEvent::ScaleFactorChanged {
                        scale_factor,
                        new_inner_size,
                    } => {
                        state.set_scale_factor(scale_factor as f32);
                        renderer.resize(*new_inner_size);
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            if let Some(command) = input.virtual_keycode.and_then(command_for) {
                                state.key(command);
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        cursor = Vec2::new(position.x as f32, position.y as f32);
                        state.cursor_moved(cursor, viewport);
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 20.0,
                        };
                        state.wheel(scroll);
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                frame_count += 1;
                let now = Instant::now();
                if now.duration_since(last_frame_time).as_secs_f32() >= 1.0 {
                    fps = frame_count as f32 / now.duration_since(last_frame_time).as_secs_f32();
                    frame_count = 0;
                    last_frame_time = now;
                }

                let frame = state.frame(state.elapsed_secs());
                let uniforms = FrameUniforms {
                    view_proj: state.camera.view_projection(renderer.aspect()),
                    light: state.light,
                    eye: state.camera.position(),
                    texture_scale: state.texture_scale,
                };

                let draws = visible(&meshes, &frame);
                for (mesh, model) in &draws {
                    renderer.update_mesh(mesh, *model, &uniforms);
                }
                let draw_list: Vec<&GpuMesh> = draws.iter().map(|(mesh, _)| *mesh).collect();

                let viewport = Vec2::new(renderer.size.width as f32, renderer.size.height as f32);
                let render_result = renderer.render_with_ui(&window, &draw_list, |ctx| {
                    draw_ui(ctx, &state, viewport, fps);
                });

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("GPU out of memory, exiting");
                        *control_flow = ControlFlow::Exit;
                    }
                    Err(e) => log::error!("render error: {e:?}"),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    })
}

fn draw_ui(ctx: &egui::Context, state: &AppState, viewport: Vec2, fps: f32) {
    // 光源标记：红色圆点
    if let Some(p) = state.camera.world_to_screen(state.light, viewport) {
        let ppp = ctx.pixels_per_point();
        let color = if state.selection == Selection::Light {
            egui::Color32::from_rgb(255, 120, 120)
        } else {
            egui::Color32::RED
        };
        ctx.layer_painter(egui::LayerId::new(
            egui::Order::Background,
            egui::Id::new("light_marker"),
        ))
        .circle_filled(egui::pos2(p.x / ppp, p.y / ppp), 6.0, color);
    }

    egui::Window::new("Controls")
        .default_open(false)
        .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
        .show(ctx, |ui| {
            ui.monospace(USAGE);
        });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(format!("Orbit speed: {:.1}", state.orbit_speed));
            ui.label("|");
            ui.label(format!(
                "Rotation: {}",
                if state.rotate_axis { "on" } else { "off" }
            ));
            ui.label("|");
            ui.label(if state.only_moon { "Moon only" } else { "Earth & Moon" });
            ui.label("|");
            ui.label(format!(
                "Night sky: {}",
                if state.display_sky { "on" } else { "off" }
            ));
            ui.label("|");
            ui.label(
                egui::RichText::new(format!("FPS: {:.1}", fps)).color(egui::Color32::GREEN),
            );
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_usage_key_is_bound() {
        let keys = [
            VirtualKeyCode::W,
            VirtualKeyCode::A,
            VirtualKeyCode::S,
            VirtualKeyCode::D,
            VirtualKeyCode::R,
            VirtualKeyCode::O,
            VirtualKeyCode::P,
            VirtualKeyCode::M,
            VirtualKeyCode::N,
        ];
        for key in keys {
            assert!(command_for(key).is_some(), "{key:?} unbound");
        }
        assert_eq!(USAGE.lines().count(), keys.len());
        assert!(command_for(VirtualKeyCode::Q).is_none());
    }

    #[test]
    fn test_make_sphere_rejects_bad_resolution() {
        let err = make_sphere("test", 1, &TangentOptions::default()).unwrap_err();
        assert!(matches!(err, MeshError::InvalidResolution { .. }));
    }

    #[test]
    fn test_make_sphere_builds_tangents() {
        let mesh = make_sphere("test", 12, &TangentOptions::default()).unwrap();
        assert_eq!(mesh.us.len(), mesh.point_count());
        assert_eq!(mesh.vertices().len(), mesh.point_count());
    }
}

use std::collections::{HashMap, HashSet};

use bevy::asset::RenderAssetUsages;
use bevy::input::ButtonInput;
use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::mesh::Indices;
use bevy::prelude::*;
use bevy::render::render_resource::PrimitiveTopology;
use bevy::window::{PresentMode, WindowResized};
use bevy_egui::{EguiContexts, EguiPlugin, egui};
use tracing::{info, trace, warn};

use dxfview_config::AppConfig;
use dxfview_core::camera::{CameraPose, ViewportSize};
use dxfview_core::color::Rgb;
use dxfview_core::geometry::Point3;
use dxfview_core::primitive::{
    MaterialStyle, PrimitiveHandle, PrimitiveShape, RenderPrimitiveSpec, StrokeStyle,
};
use dxfview_engine::navigation::PanZoomController;
use dxfview_engine::scene::{SceneError, SceneGraph};
use dxfview_io::DxfTextParser;

use crate::errors::FrontendError;
use crate::loader::{DocumentLoader, SourceReference};
use crate::viewer::{LoadStatus, Viewer};
use crate::viewport_options;

type DesktopViewer = Viewer<BevyScene, PanZoomController, DocumentLoader, DxfTextParser>;

/// 会话对场景的修改先排队，由 `apply_scene_commands` 在下一帧落地为 Bevy 实体。
enum SceneCommand {
    Add {
        handle: PrimitiveHandle,
        spec: RenderPrimitiveSpec,
        material: MaterialStyle,
    },
    Dispose(PrimitiveHandle),
    Background(Rgb),
}

#[derive(Default)]
struct BevyScene {
    pending: Vec<SceneCommand>,
    live: HashSet<PrimitiveHandle>,
    next_handle: u64,
    released: bool,
}

impl BevyScene {
    fn drain_commands(&mut self) -> Vec<SceneCommand> {
        std::mem::take(&mut self.pending)
    }
}

impl SceneGraph for BevyScene {
    fn set_background(&mut self, color: Rgb) {
        self.pending.push(SceneCommand::Background(color));
    }

    fn add_primitive(
        &mut self,
        spec: &RenderPrimitiveSpec,
        material: &MaterialStyle,
    ) -> Result<PrimitiveHandle, SceneError> {
        if self.released {
            return Err(SceneError::SurfaceReleased);
        }
        self.next_handle += 1;
        let handle = PrimitiveHandle::new(self.next_handle);
        self.pending.push(SceneCommand::Add {
            handle,
            spec: spec.clone(),
            material: *material,
        });
        self.live.insert(handle);
        Ok(handle)
    }

    fn dispose_primitive(&mut self, handle: PrimitiveHandle) -> bool {
        if !self.live.remove(&handle) {
            return false;
        }
        self.pending.push(SceneCommand::Dispose(handle));
        true
    }

    // 投影与绘制由 Bevy 相机每帧完成，位姿在 `advance_frame` 中同步
    fn update_projection(&mut self, _camera: &CameraPose) {}

    fn draw_frame(&mut self, _camera: &CameraPose) -> Result<(), SceneError> {
        if self.released {
            return Err(SceneError::SurfaceReleased);
        }
        Ok(())
    }

    fn release_surface(&mut self) {
        self.released = true;
    }

    fn primitive_count(&self) -> usize {
        self.live.len()
    }
}

#[derive(Component)]
struct MainCamera;

#[derive(Component)]
struct PrimitiveTag(PrimitiveHandle);

#[derive(Resource, Default)]
struct SpawnedPrimitives(HashMap<PrimitiveHandle, Entity>);

/// egui 面板展示的加载信息。
#[derive(Resource, Default)]
struct LoadOverlay {
    source: String,
    lines: Vec<String>,
    error: Option<String>,
}

#[derive(Resource, Default)]
struct PanState {
    is_dragging: bool,
}

pub fn launch(config: &AppConfig, source: Option<SourceReference>) -> Result<(), FrontendError> {
    let options = viewport_options(config)?;
    let loader = DocumentLoader::new(&config.loader)?;
    let [width, height] = config.viewport.size;
    let mut viewer: DesktopViewer = Viewer::mount(
        BevyScene::default(),
        PanZoomController::new(options.navigation),
        loader,
        DxfTextParser::new(),
        options,
        Some(ViewportSize::new(width, height)),
    )
    .on_success(|report| {
        info!(source = %report.source, primitives = report.primitives, "DXF 已提交到 Bevy 场景");
    })
    .on_failure(|err| {
        warn!(error = %err, "DXF 加载失败，显示空场景");
    });

    let mut overlay = LoadOverlay::default();
    if let Some(source) = source {
        overlay.source = source.to_string();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        match runtime.block_on(viewer.load(source)) {
            LoadStatus::Applied(report) => {
                overlay.lines.push(format!("实体数：{}", report.entities));
                overlay.lines.push(format!("图元数：{}", report.primitives));
                overlay.lines.push(format!("跳过：{}", report.skipped));
                for (kind, count) in &report.kinds {
                    overlay.lines.push(format!("{kind}: {count}"));
                }
            }
            LoadStatus::Failed(err) => overlay.error = Some(err.to_string()),
            LoadStatus::Superseded => {}
        }
    } else {
        overlay.source = "（未指定）".to_string();
    }

    App::new()
        .insert_non_send_resource(viewer)
        .insert_resource(overlay)
        .insert_resource(SpawnedPrimitives::default())
        .insert_resource(PanState::default())
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: config.frontend.window_title.clone(),
                present_mode: PresentMode::AutoVsync,
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin::default())
        .add_systems(Startup, setup_camera)
        .add_systems(Update, handle_resize)
        .add_systems(Update, handle_zoom)
        .add_systems(Update, handle_pan)
        .add_systems(Update, advance_frame.after(handle_zoom).after(handle_pan))
        .add_systems(Update, apply_scene_commands.after(advance_frame))
        .add_systems(Update, egui_overlay)
        .run();
    Ok(())
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        MainCamera,
        Projection::Orthographic(OrthographicProjection::default_2d()),
        Transform::from_xyz(0.0, 0.0, 999.9),
        GlobalTransform::default(),
    ));
}

fn handle_resize(mut events: MessageReader<WindowResized>, mut viewer: NonSendMut<DesktopViewer>) {
    if let Some(event) = events.read().last() {
        let size = ViewportSize::new(f64::from(event.width), f64::from(event.height));
        viewer.resize(Some(size));
    }
}

fn handle_zoom(mut events: MessageReader<MouseWheel>, mut viewer: NonSendMut<DesktopViewer>) {
    let mut factor = 1.0f64;
    for event in events.read() {
        let scroll_amount = if event.unit == MouseScrollUnit::Line {
            f64::from(event.y) * 0.1
        } else {
            f64::from(event.y) * 0.02
        };
        factor *= (1.0 + scroll_amount).clamp(0.2, 5.0);
    }
    if (factor - 1.0).abs() > f64::EPSILON {
        viewer.session_mut().navigation_mut().zoom_by(factor);
    }
}

fn handle_pan(
    mut pan_state: ResMut<PanState>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut motion_events: MessageReader<MouseMotion>,
    mut viewer: NonSendMut<DesktopViewer>,
) {
    pan_state.is_dragging = buttons.pressed(MouseButton::Middle) || buttons.pressed(MouseButton::Right);
    let mut delta = Vec2::ZERO;
    for motion in motion_events.read() {
        delta += motion.delta;
    }
    if !pan_state.is_dragging || delta == Vec2::ZERO {
        return;
    }
    let zoom = viewer.session().camera().zoom;
    let dx = -f64::from(delta.x) / zoom;
    let dy = f64::from(delta.y) / zoom;
    viewer.session_mut().navigation_mut().pan_by(dx, dy);
}

/// 推进会话一帧并把相机位姿同步到 Bevy 相机。
fn advance_frame(
    mut viewer: NonSendMut<DesktopViewer>,
    mut query: Query<(&mut Transform, &mut Projection), With<MainCamera>>,
) {
    viewer.tick();
    let camera = *viewer.session().camera();
    if let Ok((mut transform, mut projection)) = query.single_mut() {
        transform.translation.x = camera.position.x() as f32;
        transform.translation.y = camera.position.y() as f32;
        if let Projection::Orthographic(ref mut ortho) = *projection {
            ortho.scale = (1.0 / camera.zoom) as f32;
        }
    }
}

fn apply_scene_commands(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut spawned: ResMut<SpawnedPrimitives>,
    mut viewer: NonSendMut<DesktopViewer>,
) {
    for command in viewer.session_mut().scene_mut().drain_commands() {
        match command {
            SceneCommand::Add {
                handle,
                spec,
                material,
            } => {
                let (mesh, color) = primitive_mesh(&spec, &material);
                let mesh = meshes.add(mesh);
                let material = materials.add(ColorMaterial::from(color));
                let entity = commands
                    .spawn((
                        Mesh2d(mesh),
                        MeshMaterial2d(material),
                        PrimitiveTag(handle),
                        Transform::default(),
                        GlobalTransform::default(),
                        Visibility::default(),
                        InheritedVisibility::default(),
                    ))
                    .id();
                spawned.0.insert(handle, entity);
                trace!(handle = handle.get(), kind = %spec.kind, "生成 Bevy 图元");
            }
            SceneCommand::Dispose(handle) => {
                if let Some(entity) = spawned.0.remove(&handle) {
                    commands.entity(entity).despawn();
                }
            }
            SceneCommand::Background(color) => {
                commands.insert_resource(ClearColor(to_color(color)));
            }
        }
    }
}

fn egui_overlay(mut contexts: EguiContexts, overlay: Res<LoadOverlay>, spawned: Res<SpawnedPrimitives>) {
    if let Ok(ctx) = contexts.ctx_mut() {
        egui::Window::new("DXF 查看器").show(ctx, |ui| {
            ui.label(format!("文档来源：{}", overlay.source));
            for line in &overlay.lines {
                ui.label(line);
            }
            ui.label(format!("场景图元：{}", spawned.0.len()));
            if let Some(error) = &overlay.error {
                ui.separator();
                ui.colored_label(egui::Color32::LIGHT_RED, error);
            }
        });
    }
}

fn primitive_mesh(spec: &RenderPrimitiveSpec, material: &MaterialStyle) -> (Mesh, Color) {
    let positions = |points: &[Point3]| -> Vec<[f32; 3]> {
        points
            .iter()
            .map(|p| [p.x() as f32, p.y() as f32, 0.0])
            .collect()
    };

    match (&spec.shape, &spec.stroke) {
        (PrimitiveShape::TriangleMesh { indices }, _) => {
            let mut mesh = Mesh::new(
                PrimitiveTopology::TriangleList,
                RenderAssetUsages::RENDER_WORLD,
            );
            mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions(&spec.points));
            mesh.insert_indices(Indices::U32(indices.clone()));
            (mesh, to_color(material.face_color))
        }
        (_, StrokeStyle::Dashed { line_distances }) => {
            let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::RENDER_WORLD);
            mesh.insert_attribute(
                Mesh::ATTRIBUTE_POSITION,
                dash_segments(
                    &spec.points,
                    line_distances,
                    material.dash_size,
                    material.gap_size,
                ),
            );
            (mesh, to_color(material.line_color))
        }
        (_, StrokeStyle::Solid) => {
            let mut mesh = Mesh::new(PrimitiveTopology::LineStrip, RenderAssetUsages::RENDER_WORLD);
            mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions(&spec.points));
            (mesh, to_color(material.line_color))
        }
    }
}

/// 按累计距离把折线切成虚线段，输出 LineList 顶点对。
fn dash_segments(points: &[Point3], distances: &[f64], dash: f64, gap: f64) -> Vec<[f32; 3]> {
    let mut out = Vec::new();
    if points.len() < 2 || distances.len() != points.len() {
        return out;
    }
    let dash = dash.max(f64::EPSILON);
    let period = dash + gap.max(0.0);
    let vertex = |v: glam::DVec3| [v.x as f32, v.y as f32, 0.0];

    for i in 1..points.len() {
        let a = points[i - 1].as_vec3();
        let b = points[i].as_vec3();
        let (d0, d1) = (distances[i - 1], distances[i]);
        let length = d1 - d0;
        if length <= 0.0 {
            continue;
        }
        let mut cursor = d0;
        while cursor < d1 {
            let phase = cursor % period;
            let next = if phase < dash {
                let end = (cursor + dash - phase).min(d1);
                out.push(vertex(a.lerp(b, (cursor - d0) / length)));
                out.push(vertex(a.lerp(b, (end - d0) / length)));
                end
            } else {
                cursor + (period - phase)
            };
            if next <= cursor {
                break;
            }
            cursor = next;
        }
    }
    out
}

fn to_color(color: Rgb) -> Color {
    let [r, g, b] = color.to_unit();
    Color::srgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use dxfview_core::entity::EntityKind;
    use dxfview_core::primitive::line_distances;

    use super::*;

    #[test]
    fn dash_segments_follow_pattern() {
        let points = [Point3::ORIGIN, Point3::new(10.0, 0.0, 0.0)];
        let segments = dash_segments(&points, &line_distances(&points), 3.0, 1.0);
        // 0-3, 4-7, 8-10
        assert_eq!(segments.len(), 6);
        assert_eq!(segments[0], [0.0, 0.0, 0.0]);
        assert_eq!(segments[1], [3.0, 0.0, 0.0]);
        assert_eq!(segments[2], [4.0, 0.0, 0.0]);
        assert_eq!(segments[5], [10.0, 0.0, 0.0]);
    }

    #[test]
    fn bevy_scene_queues_commands_and_counts_live_primitives() {
        let mut scene = BevyScene::default();
        let spec = RenderPrimitiveSpec::line_strip(
            EntityKind::Line,
            "0",
            vec![Point3::ORIGIN, Point3::new(1.0, 1.0, 0.0)],
        );
        let handle = scene
            .add_primitive(&spec, &MaterialStyle::default())
            .expect("add primitive");
        assert_eq!(scene.primitive_count(), 1);
        assert!(scene.dispose_primitive(handle));
        assert!(!scene.dispose_primitive(handle));
        assert_eq!(scene.primitive_count(), 0);
        assert_eq!(scene.drain_commands().len(), 2);
        assert!(scene.drain_commands().is_empty());
    }
}

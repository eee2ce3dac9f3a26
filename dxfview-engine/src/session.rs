use tracing::{debug, info, warn};

use dxfview_core::camera::{CameraPose, ViewportSize};
use dxfview_core::color::Rgb;
use dxfview_core::geometry::{Bounds3D, Point3};
use dxfview_core::primitive::{MaterialStyle, PrimitiveHandle};

use crate::errors::EngineError;
use crate::framing::frame;
use crate::navigation::{NavigationController, NavigationOptions};
use crate::scene::SceneGraph;
use crate::translate::Translation;

/// 每次加载请求对应的代际令牌，只有最新令牌的结果才会被提交。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    #[inline]
    pub fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewportOptions {
    pub background: Rgb,
    pub material: MaterialStyle,
    /// 初始相机位置，相机看向其在 XY 平面上的投影点。
    pub camera_start: Option<Point3>,
    /// 取景时固定的相机高度，缺省按包围盒推算。
    pub camera_z: Option<f64>,
    pub navigation: NavigationOptions,
}

impl Default for ViewportOptions {
    fn default() -> Self {
        Self {
            background: Rgb::BLACK,
            material: MaterialStyle::default(),
            camera_start: None,
            camera_z: None,
            navigation: NavigationOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitSummary {
    pub ticket: LoadTicket,
    pub primitives: usize,
    /// 被替换掉的上一批图元数量。
    pub disposed: usize,
    pub skipped: usize,
    pub bounds: Bounds3D,
    pub framed: bool,
    pub camera: CameraPose,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Applied(CommitSummary),
    /// 已有更新的加载请求，本次结果被丢弃，场景未被触碰。
    Superseded {
        ticket: LoadTicket,
        current: LoadTicket,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRequest {
    Continue,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    TornDown,
}

/// 一个已挂载视口的全部状态：场景、相机、导航控制器与当前加载的图元。
///
/// 会话独占这些资源。重新加载时先添加新图元再释放旧图元，
/// 卸载（`teardown` 或 drop）时释放全部资源并停止帧循环。
pub struct ViewportSession<S: SceneGraph, N: NavigationController> {
    scene: S,
    navigation: N,
    camera: CameraPose,
    options: ViewportOptions,
    viewport: Option<ViewportSize>,
    generation: u64,
    committed: Vec<PrimitiveHandle>,
    bounds: Bounds3D,
    state: SessionState,
    frames: u64,
}

impl<S: SceneGraph, N: NavigationController> ViewportSession<S, N> {
    pub fn mount(
        mut scene: S,
        mut navigation: N,
        options: ViewportOptions,
        size: Option<ViewportSize>,
    ) -> Self {
        scene.set_background(options.background);
        let camera = match options.camera_start {
            Some(start) => CameraPose::looking_at(start, Point3::new(start.x(), start.y(), 0.0)),
            None => CameraPose::default(),
        };
        navigation.apply_options(&options.navigation);
        navigation.set_target(camera.target);

        let mut session = Self {
            scene,
            navigation,
            camera,
            options,
            viewport: None,
            generation: 0,
            committed: Vec::new(),
            bounds: Bounds3D::empty(),
            state: SessionState::Active,
            frames: 0,
        };
        session.handle_resize(size);
        info!(background = %session.options.background, "视口已挂载");
        session
    }

    /// 发起新一代加载，之前发出的令牌随即失效。
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        debug!(generation = self.generation, "开始新的加载");
        LoadTicket(self.generation)
    }

    #[inline]
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.state == SessionState::Active && ticket.0 == self.generation
    }

    /// 提交一次加载的转换结果。
    ///
    /// 任一图元添加失败时，已添加的部分全部释放，旧场景保持不变。
    pub fn commit(
        &mut self,
        ticket: LoadTicket,
        translation: &Translation,
    ) -> Result<CommitOutcome, EngineError> {
        if self.state == SessionState::TornDown {
            return Err(EngineError::SessionTornDown);
        }
        if ticket.0 != self.generation {
            debug!(
                ticket = ticket.0,
                current = self.generation,
                "丢弃过期的加载结果"
            );
            return Ok(CommitOutcome::Superseded {
                ticket,
                current: LoadTicket(self.generation),
            });
        }

        let mut added = Vec::with_capacity(translation.primitives.len());
        for primitive in &translation.primitives {
            match self.scene.add_primitive(primitive, &self.options.material) {
                Ok(handle) => added.push(handle),
                Err(err) => {
                    warn!(
                        added = added.len(),
                        total = translation.primitives.len(),
                        error = %err,
                        "图元提交失败，回滚本次加载"
                    );
                    for handle in added {
                        self.scene.dispose_primitive(handle);
                    }
                    return Err(err.into());
                }
            }
        }

        let previous = std::mem::replace(&mut self.committed, added);
        let disposed = previous
            .into_iter()
            .filter(|handle| self.scene.dispose_primitive(*handle))
            .count();

        self.bounds = translation.bounds;
        let framed = !self.bounds.is_empty();
        if framed {
            self.camera = frame(&self.camera, &self.bounds, self.options.camera_z);
            self.navigation.set_target(self.camera.target);
        }
        self.scene.update_projection(&self.camera);
        self.scene.draw_frame(&self.camera)?;
        self.frames += 1;

        info!(
            ticket = ticket.0,
            primitives = self.committed.len(),
            disposed,
            skipped = translation.skipped,
            framed,
            "加载结果已提交"
        );
        Ok(CommitOutcome::Applied(CommitSummary {
            ticket,
            primitives: self.committed.len(),
            disposed,
            skipped: translation.skipped,
            bounds: self.bounds,
            framed,
            camera: self.camera,
        }))
    }

    /// 容器尺寸变化。尺寸缺失或尚未布局时不做任何事并返回 `false`。
    pub fn handle_resize(&mut self, size: Option<ViewportSize>) -> bool {
        if self.state == SessionState::TornDown {
            return false;
        }
        let Some(size) = size.filter(|size| !size.is_degenerate()) else {
            return false;
        };
        self.viewport = Some(size);
        self.camera.set_extents(size);
        self.scene.update_projection(&self.camera);
        match self.scene.draw_frame(&self.camera) {
            Ok(()) => self.frames += 1,
            Err(err) => warn!(error = %err, "尺寸变化后的重绘失败"),
        }
        true
    }

    /// 推进一帧：先更新导航，再绘制。
    pub fn tick(&mut self) -> FrameRequest {
        if self.state == SessionState::TornDown {
            return FrameRequest::Stop;
        }
        if self.navigation.update(&mut self.camera) {
            self.scene.update_projection(&self.camera);
        }
        match self.scene.draw_frame(&self.camera) {
            Ok(()) => {
                self.frames += 1;
                FrameRequest::Continue
            }
            Err(err) => {
                warn!(error = %err, "绘制失败，停止帧循环");
                FrameRequest::Stop
            }
        }
    }

    /// 释放全部资源。重复调用无副作用。
    pub fn teardown(&mut self) {
        if self.state == SessionState::TornDown {
            return;
        }
        let count = self.committed.len();
        for handle in self.committed.drain(..) {
            self.scene.dispose_primitive(handle);
        }
        self.navigation.dispose();
        self.scene.release_surface();
        self.state = SessionState::TornDown;
        // 让仍在途中的加载令牌失效
        self.generation += 1;
        info!(disposed = count, frames = self.frames, "视口已卸载");
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn camera(&self) -> &CameraPose {
        &self.camera
    }

    pub fn bounds(&self) -> &Bounds3D {
        &self.bounds
    }

    pub fn viewport(&self) -> Option<ViewportSize> {
        self.viewport
    }

    pub fn options(&self) -> &ViewportOptions {
        &self.options
    }

    pub fn committed_handles(&self) -> &[PrimitiveHandle] {
        &self.committed
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn navigation(&self) -> &N {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut N {
        &mut self.navigation
    }
}

impl<S: SceneGraph, N: NavigationController> Drop for ViewportSession<S, N> {
    fn drop(&mut self) {
        self.teardown();
    }
}

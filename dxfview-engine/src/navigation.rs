use glam::{DQuat, DVec2, DVec3};
use serde::{Deserialize, Serialize};

use dxfview_core::camera::CameraPose;
use dxfview_core::geometry::Point3;

pub const MIN_ZOOM: f64 = 0.01;
pub const MAX_ZOOM: f64 = 1_000.0;

const SETTLE_EPSILON: f64 = 1e-6;

/// 指针导航的开关与阻尼设置。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationOptions {
    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub enable_rotate: bool,
    pub enable_damping: bool,
    pub damping_factor: f64,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            enable_pan: true,
            enable_zoom: true,
            enable_rotate: false,
            enable_damping: true,
            damping_factor: 0.05,
        }
    }
}

/// 每帧驱动相机的导航控制器。
pub trait NavigationController {
    fn apply_options(&mut self, options: &NavigationOptions);

    fn set_target(&mut self, target: Point3);

    /// 推进一帧，返回相机是否发生变化。
    fn update(&mut self, camera: &mut CameraPose) -> bool;

    fn dispose(&mut self);
}

/// 以平移、缩放、绕目标旋转为输入的简单控制器。
///
/// 输入先累积为速度。开启阻尼时每帧只作用 `damping_factor` 份，剩余部分按
/// `1 - damping_factor` 衰减到后续帧，累计位移等于输入量；否则一帧内消耗完毕。
#[derive(Debug, Clone)]
pub struct PanZoomController {
    options: NavigationOptions,
    target: Point3,
    pan_velocity: DVec2,
    /// 对数缩放速度，`zoom *= exp(v)`。
    zoom_velocity: f64,
    rotate_velocity: f64,
    disposed: bool,
}

impl Default for PanZoomController {
    fn default() -> Self {
        Self::new(NavigationOptions::default())
    }
}

impl PanZoomController {
    pub fn new(options: NavigationOptions) -> Self {
        Self {
            options: sanitize(options),
            target: Point3::ORIGIN,
            pan_velocity: DVec2::ZERO,
            zoom_velocity: 0.0,
            rotate_velocity: 0.0,
            disposed: false,
        }
    }

    pub fn options(&self) -> &NavigationOptions {
        &self.options
    }

    pub fn target(&self) -> Point3 {
        self.target
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// 按世界坐标平移。禁用平移时忽略输入。
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if self.accepts(self.options.enable_pan) {
            self.pan_velocity += DVec2::new(dx, dy);
        }
    }

    /// 以倍数缩放，`factor > 1` 表示放大。
    pub fn zoom_by(&mut self, factor: f64) {
        if self.accepts(self.options.enable_zoom) && factor.is_finite() && factor > 0.0 {
            self.zoom_velocity += factor.ln();
        }
    }

    /// 绕目标点所在的 Y 轴旋转（弧度）。
    pub fn rotate_by(&mut self, radians: f64) {
        if self.accepts(self.options.enable_rotate) && radians.is_finite() {
            self.rotate_velocity += radians;
        }
    }

    pub fn is_settled(&self) -> bool {
        self.pan_velocity.length_squared() < SETTLE_EPSILON * SETTLE_EPSILON
            && self.zoom_velocity.abs() < SETTLE_EPSILON
            && self.rotate_velocity.abs() < SETTLE_EPSILON
    }

    fn accepts(&self, enabled: bool) -> bool {
        enabled && !self.disposed
    }

    /// 本帧作用的速度比例。阻尼系数为 0 时退化为无阻尼。
    fn step_scale(&self) -> f64 {
        if self.options.enable_damping && self.options.damping_factor > 0.0 {
            self.options.damping_factor
        } else {
            1.0
        }
    }

    fn decay(&mut self, scale: f64) {
        let keep = 1.0 - scale;
        self.pan_velocity *= keep;
        self.zoom_velocity *= keep;
        self.rotate_velocity *= keep;
        if self.is_settled() {
            self.pan_velocity = DVec2::ZERO;
            self.zoom_velocity = 0.0;
            self.rotate_velocity = 0.0;
        }
    }
}

impl NavigationController for PanZoomController {
    fn apply_options(&mut self, options: &NavigationOptions) {
        self.options = sanitize(*options);
        if !self.options.enable_pan {
            self.pan_velocity = DVec2::ZERO;
        }
        if !self.options.enable_zoom {
            self.zoom_velocity = 0.0;
        }
        if !self.options.enable_rotate {
            self.rotate_velocity = 0.0;
        }
    }

    fn set_target(&mut self, target: Point3) {
        self.target = target;
    }

    fn update(&mut self, camera: &mut CameraPose) -> bool {
        if self.disposed || self.is_settled() {
            return false;
        }

        let scale = self.step_scale();
        let mut changed = false;
        if self.pan_velocity != DVec2::ZERO {
            let step = self.pan_velocity * scale;
            let offset = DVec3::new(step.x, step.y, 0.0);
            self.target = Point3::from_vec(self.target.as_vec3() + offset);
            camera.position = Point3::from_vec(camera.position.as_vec3() + offset);
            changed = true;
        }
        if self.zoom_velocity != 0.0 {
            let zoom = (camera.zoom * (self.zoom_velocity * scale).exp()).clamp(MIN_ZOOM, MAX_ZOOM);
            changed |= zoom != camera.zoom;
            camera.zoom = zoom;
        }
        if self.rotate_velocity != 0.0 {
            let rotation = DQuat::from_rotation_y(self.rotate_velocity * scale);
            let arm = camera.position.as_vec3() - self.target.as_vec3();
            camera.position = Point3::from_vec(self.target.as_vec3() + rotation * arm);
            changed = true;
        }
        camera.target = self.target;

        self.decay(scale);
        changed
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.pan_velocity = DVec2::ZERO;
        self.zoom_velocity = 0.0;
        self.rotate_velocity = 0.0;
    }
}

fn sanitize(mut options: NavigationOptions) -> NavigationOptions {
    options.damping_factor = if options.damping_factor.is_finite() {
        options.damping_factor.clamp(0.0, 1.0)
    } else {
        NavigationOptions::default().damping_factor
    };
    options
}

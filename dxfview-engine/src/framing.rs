use dxfview_core::camera::CameraPose;
use dxfview_core::geometry::{Bounds3D, Point3};

/// 自动取景得到的最小相机高度。
pub const MIN_FRAMING_Z: f64 = 1.0;
/// 相机高度相对于包围盒最大跨度的倍数。
pub const FRAMING_EXTENT_FACTOR: f64 = 2.0;

/// 将相机对准包围盒中心。
///
/// 空包围盒时原样返回；否则只调整位置、目标和深度范围，
/// 正交投影的左右上下范围与缩放保持不变（它们跟随视口像素尺寸）。
pub fn frame(camera: &CameraPose, bounds: &Bounds3D, explicit_z: Option<f64>) -> CameraPose {
    if bounds.is_empty() {
        return *camera;
    }

    let center = bounds.center();
    let size = bounds.size();
    let z = explicit_z
        .filter(|z| z.is_finite())
        .unwrap_or_else(|| (size.x.max(size.y) * FRAMING_EXTENT_FACTOR).max(MIN_FRAMING_Z));

    CameraPose {
        position: Point3::new(center.x(), center.y(), z),
        target: center,
        near: CameraPose::DEFAULT_NEAR,
        far: (2.0 * z).max(1.0),
        ..*camera
    }
}

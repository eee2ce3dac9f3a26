use std::collections::BTreeMap;

use thiserror::Error;
use tracing::trace;

use dxfview_core::camera::CameraPose;
use dxfview_core::color::Rgb;
use dxfview_core::primitive::{MaterialStyle, PrimitiveHandle, RenderPrimitiveSpec};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("绘制表面已释放")]
    SurfaceReleased,
    #[error("场景图元数量超出上限 {limit}")]
    CapacityExceeded { limit: usize },
    #[error("渲染后端错误：{0}")]
    Backend(String),
}

/// 渲染后端需要提供的最小能力集合。
///
/// 会话只通过该接口创建、释放图元并请求绘制，不关心具体的 GPU 资源。
pub trait SceneGraph {
    fn set_background(&mut self, color: Rgb);

    fn add_primitive(
        &mut self,
        spec: &RenderPrimitiveSpec,
        material: &MaterialStyle,
    ) -> Result<PrimitiveHandle, SceneError>;

    /// 释放图元，句柄未知时返回 `false`。
    fn dispose_primitive(&mut self, handle: PrimitiveHandle) -> bool;

    fn update_projection(&mut self, camera: &CameraPose);

    fn draw_frame(&mut self, camera: &CameraPose) -> Result<(), SceneError>;

    /// 释放绘制表面。之后的添加与绘制都应失败。
    fn release_surface(&mut self);

    fn primitive_count(&self) -> usize;
}

/// 存放于场景中的图元及其材质。
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntry {
    pub spec: RenderPrimitiveSpec,
    pub material: MaterialStyle,
}

/// 无头场景：只记录图元与调用次数，用于 CLI 模式和测试。
#[derive(Debug, Default)]
pub struct MemoryScene {
    entries: BTreeMap<PrimitiveHandle, SceneEntry>,
    next_handle: u64,
    capacity: Option<usize>,
    background: Option<Rgb>,
    last_camera: Option<CameraPose>,
    frames_drawn: u64,
    projection_updates: u64,
    disposed: u64,
    released: bool,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// 限制同时存在的图元数量，超出时 `add_primitive` 返回错误。
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            capacity: Some(limit),
            ..Self::default()
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&PrimitiveHandle, &SceneEntry)> {
        self.entries.iter()
    }

    pub fn entry(&self, handle: PrimitiveHandle) -> Option<&SceneEntry> {
        self.entries.get(&handle)
    }

    pub fn background(&self) -> Option<Rgb> {
        self.background
    }

    pub fn last_camera(&self) -> Option<&CameraPose> {
        self.last_camera.as_ref()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn projection_updates(&self) -> u64 {
        self.projection_updates
    }

    pub fn disposed_count(&self) -> u64 {
        self.disposed
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl SceneGraph for MemoryScene {
    fn set_background(&mut self, color: Rgb) {
        self.background = Some(color);
    }

    fn add_primitive(
        &mut self,
        spec: &RenderPrimitiveSpec,
        material: &MaterialStyle,
    ) -> Result<PrimitiveHandle, SceneError> {
        if self.released {
            return Err(SceneError::SurfaceReleased);
        }
        if let Some(limit) = self.capacity {
            if self.entries.len() >= limit {
                return Err(SceneError::CapacityExceeded { limit });
            }
        }
        self.next_handle += 1;
        let handle = PrimitiveHandle::new(self.next_handle);
        self.entries.insert(
            handle,
            SceneEntry {
                spec: spec.clone(),
                material: *material,
            },
        );
        trace!(handle = handle.get(), kind = %spec.kind, "添加图元");
        Ok(handle)
    }

    fn dispose_primitive(&mut self, handle: PrimitiveHandle) -> bool {
        let removed = self.entries.remove(&handle).is_some();
        if removed {
            self.disposed += 1;
        }
        removed
    }

    fn update_projection(&mut self, camera: &CameraPose) {
        self.projection_updates += 1;
        self.last_camera = Some(*camera);
    }

    fn draw_frame(&mut self, camera: &CameraPose) -> Result<(), SceneError> {
        if self.released {
            return Err(SceneError::SurfaceReleased);
        }
        self.frames_drawn += 1;
        self.last_camera = Some(*camera);
        Ok(())
    }

    fn release_surface(&mut self) {
        self.released = true;
    }

    fn primitive_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use dxfview_core::entity::EntityKind;
    use dxfview_core::geometry::Point3;

    use super::*;

    fn spec() -> RenderPrimitiveSpec {
        RenderPrimitiveSpec::line_strip(
            EntityKind::Line,
            "0",
            vec![Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)],
        )
    }

    #[test]
    fn handles_are_unique_and_disposal_is_single_shot() {
        let mut scene = MemoryScene::new();
        let material = MaterialStyle::default();
        let a = scene.add_primitive(&spec(), &material).unwrap();
        let b = scene.add_primitive(&spec(), &material).unwrap();
        assert_ne!(a, b);
        assert_eq!(scene.primitive_count(), 2);

        assert_eq!(scene.entry(a).map(|entry| &entry.spec), Some(&spec()));

        assert!(scene.dispose_primitive(a));
        assert!(!scene.dispose_primitive(a));
        assert_eq!(scene.primitive_count(), 1);
        assert_eq!(scene.disposed_count(), 1);
        assert!(scene.entry(a).is_none());
        let live: Vec<_> = scene.entries().map(|(handle, _)| *handle).collect();
        assert_eq!(live, vec![b]);
    }

    #[test]
    fn capacity_limit_rejects_extra_primitives() {
        let mut scene = MemoryScene::with_capacity_limit(1);
        let material = MaterialStyle::default();
        scene.add_primitive(&spec(), &material).unwrap();
        assert_eq!(
            scene.add_primitive(&spec(), &material),
            Err(SceneError::CapacityExceeded { limit: 1 })
        );
    }

    #[test]
    fn released_surface_refuses_work() {
        let mut scene = MemoryScene::new();
        scene.release_surface();
        let camera = CameraPose::default();
        assert_eq!(scene.draw_frame(&camera), Err(SceneError::SurfaceReleased));
        assert!(
            scene
                .add_primitive(&spec(), &MaterialStyle::default())
                .is_err()
        );
        assert_eq!(scene.frames_drawn(), 0);
    }
}

pub mod geometry {
    use glam::DVec3;
    use serde::{Deserialize, Serialize};

    /// 三维点，内部以 `glam::DVec3` 表示。二维实体的 Z 统一补 0。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point3(pub DVec3);

    impl Point3 {
        pub const ORIGIN: Point3 = Point3(DVec3::ZERO);

        #[inline]
        pub fn new(x: f64, y: f64, z: f64) -> Self {
            Self(DVec3::new(x, y, z))
        }

        #[inline]
        pub fn from_xy(x: f64, y: f64) -> Self {
            Self(DVec3::new(x, y, 0.0))
        }

        #[inline]
        pub fn from_vec(vec: DVec3) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn z(self) -> f64 {
            self.0.z
        }

        #[inline]
        pub fn distance(self, other: Point3) -> f64 {
            self.0.distance(other.0)
        }

        #[inline]
        pub fn as_vec3(self) -> DVec3 {
            self.0
        }
    }

    impl From<DVec3> for Point3 {
        fn from(value: DVec3) -> Self {
            Self(value)
        }
    }

    /// 轴对齐包围盒。初始为空（min 为 +∞，max 为 -∞），吸收至少一个点后才有意义。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds3D {
        min: Point3,
        max: Point3,
    }

    impl Bounds3D {
        #[inline]
        pub fn new(min: Point3, max: Point3) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
                max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y() || self.min.z() > self.max.z()
        }

        #[inline]
        pub fn min(&self) -> Point3 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point3 {
            self.max
        }

        pub fn include_point(&mut self, point: Point3) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            self.min = Point3::from_vec(self.min.as_vec3().min(point.as_vec3()));
            self.max = Point3::from_vec(self.max.as_vec3().max(point.as_vec3()));
        }

        pub fn include_points<I>(&mut self, points: I)
        where
            I: IntoIterator<Item = Point3>,
        {
            for point in points {
                self.include_point(point);
            }
        }

        pub fn include_bounds(&mut self, other: &Bounds3D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        /// 判断点是否落在包围盒内（含边界）。
        pub fn contains(&self, point: Point3) -> bool {
            if self.is_empty() {
                return false;
            }
            let p = point.as_vec3();
            p.cmpge(self.min.as_vec3()).all() && p.cmple(self.max.as_vec3()).all()
        }

        #[inline]
        pub fn center(&self) -> Point3 {
            debug_assert!(!self.is_empty());
            Point3::from_vec((self.min.as_vec3() + self.max.as_vec3()) * 0.5)
        }

        /// 各轴跨度（宽、高、深）。
        #[inline]
        pub fn size(&self) -> DVec3 {
            debug_assert!(!self.is_empty());
            self.max.as_vec3() - self.min.as_vec3()
        }
    }

    impl Default for Bounds3D {
        fn default() -> Self {
            Self::empty()
        }
    }
}

pub mod color {
    use std::fmt;
    use std::str::FromStr;

    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Rgb {
        pub r: u8,
        pub g: u8,
        pub b: u8,
    }

    impl Rgb {
        pub const BLACK: Rgb = Rgb::new(0, 0, 0);
        pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);

        #[inline]
        pub const fn new(r: u8, g: u8, b: u8) -> Self {
            Self { r, g, b }
        }

        /// 线性归一化到 `[0, 1]`，供渲染后端构造材质颜色。
        pub fn to_unit(self) -> [f32; 3] {
            [
                f32::from(self.r) / 255.0,
                f32::from(self.g) / 255.0,
                f32::from(self.b) / 255.0,
            ]
        }
    }

    impl fmt::Display for Rgb {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum ColorParseError {
        #[error("颜色值 {0:?} 不是 #RRGGBB 格式")]
        InvalidFormat(String),
    }

    impl FromStr for Rgb {
        type Err = ColorParseError;

        fn from_str(raw: &str) -> Result<Self, Self::Err> {
            let trimmed = raw.trim();
            let hex = trimmed
                .strip_prefix('#')
                .or_else(|| trimmed.strip_prefix("0x"))
                .unwrap_or(trimmed);
            if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
                return Err(ColorParseError::InvalidFormat(raw.to_string()));
            }
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16)
                    .map_err(|_| ColorParseError::InvalidFormat(raw.to_string()))
            };
            Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
        }
    }
}

pub mod entity {
    use std::fmt;

    use serde::{Deserialize, Serialize};

    use crate::geometry::Point3;

    pub const DEFAULT_LAYER: &str = "0";

    /// 解析器给出的原始坐标。字段可能缺失，合法性由转换阶段判定。
    #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
    pub struct RawPoint {
        pub x: Option<f64>,
        pub y: Option<f64>,
        pub z: Option<f64>,
    }

    impl RawPoint {
        #[inline]
        pub fn xy(x: f64, y: f64) -> Self {
            Self {
                x: Some(x),
                y: Some(y),
                z: None,
            }
        }

        #[inline]
        pub fn xyz(x: f64, y: f64, z: f64) -> Self {
            Self {
                x: Some(x),
                y: Some(y),
                z: Some(z),
            }
        }

        /// 提升为 `Point3`：X/Y 缺失或非有限值时返回 `None`，Z 缺失时取 0。
        pub fn lift(&self) -> Option<Point3> {
            let x = self.x.filter(|v| v.is_finite())?;
            let y = self.y.filter(|v| v.is_finite())?;
            let z = self.z.filter(|v| v.is_finite()).unwrap_or(0.0);
            Some(Point3::new(x, y, z))
        }

        #[inline]
        pub fn is_unset(&self) -> bool {
            self.x.is_none() && self.y.is_none() && self.z.is_none()
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum EntityKind {
        Line,
        Arc,
        Circle,
        Spline,
        LwPolyline,
        Polyline,
        Face3D,
        Solid,
    }

    impl EntityKind {
        /// 按 DXF 类型标记识别实体种类，未知标记返回 `None`。
        pub fn from_tag(tag: &str) -> Option<Self> {
            match tag.trim() {
                "LINE" => Some(Self::Line),
                "ARC" => Some(Self::Arc),
                "CIRCLE" => Some(Self::Circle),
                "SPLINE" => Some(Self::Spline),
                "LWPOLYLINE" => Some(Self::LwPolyline),
                "POLYLINE" => Some(Self::Polyline),
                "3DFACE" => Some(Self::Face3D),
                "SOLID" => Some(Self::Solid),
                _ => None,
            }
        }

        pub fn tag(self) -> &'static str {
            match self {
                Self::Line => "LINE",
                Self::Arc => "ARC",
                Self::Circle => "CIRCLE",
                Self::Spline => "SPLINE",
                Self::LwPolyline => "LWPOLYLINE",
                Self::Polyline => "POLYLINE",
                Self::Face3D => "3DFACE",
                Self::Solid => "SOLID",
            }
        }
    }

    impl fmt::Display for EntityKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.tag())
        }
    }

    /// LINE 支持两种输入形态：`start`/`end` 或 `vertices` 数组。
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct LineEntity {
        pub layer: String,
        pub start: Option<RawPoint>,
        pub end: Option<RawPoint>,
        pub vertices: Vec<RawPoint>,
        pub line_type: Option<String>,
    }

    /// 角度单位为弧度。
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct ArcEntity {
        pub layer: String,
        pub center: Option<RawPoint>,
        pub radius: Option<f64>,
        pub start_angle: Option<f64>,
        pub end_angle: Option<f64>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct CircleEntity {
        pub layer: String,
        pub center: Option<RawPoint>,
        pub radius: Option<f64>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct SplineEntity {
        pub layer: String,
        pub control_points: Vec<RawPoint>,
        pub fit_points: Vec<RawPoint>,
        pub closed: bool,
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub enum PolylineKind {
        #[default]
        Light,
        Heavy,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct PolylineEntity {
        pub layer: String,
        pub kind: PolylineKind,
        pub vertices: Vec<RawPoint>,
        pub closed: bool,
        pub line_type: Option<String>,
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub enum FaceKind {
        #[default]
        Face3D,
        Solid,
    }

    /// 3DFACE 与 SOLID 共用结构，最多 4 个顶点。
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct FaceEntity {
        pub layer: String,
        pub kind: FaceKind,
        pub vertices: Vec<RawPoint>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum ParsedEntity {
        Line(LineEntity),
        Arc(ArcEntity),
        Circle(CircleEntity),
        Spline(SplineEntity),
        Polyline(PolylineEntity),
        Face(FaceEntity),
        /// 未识别的类型标记，转换阶段保证为空操作。
        Unrecognized { kind: String },
    }

    impl ParsedEntity {
        pub fn kind(&self) -> Option<EntityKind> {
            match self {
                ParsedEntity::Line(_) => Some(EntityKind::Line),
                ParsedEntity::Arc(_) => Some(EntityKind::Arc),
                ParsedEntity::Circle(_) => Some(EntityKind::Circle),
                ParsedEntity::Spline(_) => Some(EntityKind::Spline),
                ParsedEntity::Polyline(polyline) => Some(match polyline.kind {
                    PolylineKind::Light => EntityKind::LwPolyline,
                    PolylineKind::Heavy => EntityKind::Polyline,
                }),
                ParsedEntity::Face(face) => Some(match face.kind {
                    FaceKind::Face3D => EntityKind::Face3D,
                    FaceKind::Solid => EntityKind::Solid,
                }),
                ParsedEntity::Unrecognized { .. } => None,
            }
        }

        /// 原始类型标记，便于日志输出。
        pub fn type_tag(&self) -> &str {
            match self {
                ParsedEntity::Unrecognized { kind } => kind,
                other => other.kind().map(EntityKind::tag).unwrap_or_default(),
            }
        }

        pub fn layer_name(&self) -> Option<&str> {
            match self {
                ParsedEntity::Line(line) => Some(&line.layer),
                ParsedEntity::Arc(arc) => Some(&arc.layer),
                ParsedEntity::Circle(circle) => Some(&circle.layer),
                ParsedEntity::Spline(spline) => Some(&spline.layer),
                ParsedEntity::Polyline(polyline) => Some(&polyline.layer),
                ParsedEntity::Face(face) => Some(&face.layer),
                ParsedEntity::Unrecognized { .. } => None,
            }
        }
    }

    /// 解析结果：按文件顺序排列的实体序列。
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct ParsedDocument {
        pub entities: Vec<ParsedEntity>,
    }

    impl ParsedDocument {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&mut self, entity: ParsedEntity) {
            self.entities.push(entity);
        }

        #[inline]
        pub fn entities(&self) -> &[ParsedEntity] {
            &self.entities
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.entities.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.entities.is_empty()
        }

        pub fn recognized_count(&self) -> usize {
            self.entities
                .iter()
                .filter(|entity| entity.kind().is_some())
                .count()
        }
    }
}

pub mod primitive {
    use serde::{Deserialize, Serialize};

    use crate::color::Rgb;
    use crate::entity::EntityKind;
    use crate::geometry::Point3;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum PrimitiveShape {
        LineStrip,
        /// 闭合环，点序列已包含回到起点的闭合点。
        LineLoop,
        TriangleMesh { indices: Vec<u32> },
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum StrokeStyle {
        Solid,
        /// 虚线需要沿折线预先累计的距离，长度与点数一致。
        Dashed { line_distances: Vec<f64> },
    }

    /// 转换阶段产出的可渲染图元描述，由场景图负责落地为实际资源。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RenderPrimitiveSpec {
        pub kind: EntityKind,
        pub layer: String,
        pub shape: PrimitiveShape,
        pub points: Vec<Point3>,
        pub stroke: StrokeStyle,
    }

    impl RenderPrimitiveSpec {
        pub fn line_strip(kind: EntityKind, layer: impl Into<String>, points: Vec<Point3>) -> Self {
            Self {
                kind,
                layer: layer.into(),
                shape: PrimitiveShape::LineStrip,
                points,
                stroke: StrokeStyle::Solid,
            }
        }

        pub fn line_loop(kind: EntityKind, layer: impl Into<String>, points: Vec<Point3>) -> Self {
            Self {
                kind,
                layer: layer.into(),
                shape: PrimitiveShape::LineLoop,
                points,
                stroke: StrokeStyle::Solid,
            }
        }

        pub fn mesh(
            kind: EntityKind,
            layer: impl Into<String>,
            points: Vec<Point3>,
            indices: Vec<u32>,
        ) -> Self {
            Self {
                kind,
                layer: layer.into(),
                shape: PrimitiveShape::TriangleMesh { indices },
                points,
                stroke: StrokeStyle::Solid,
            }
        }

        /// 切换为虚线，并按当前点序列计算累计距离。
        pub fn dashed(mut self) -> Self {
            self.stroke = StrokeStyle::Dashed {
                line_distances: line_distances(&self.points),
            };
            self
        }

        #[inline]
        pub fn point_count(&self) -> usize {
            self.points.len()
        }

        #[inline]
        pub fn is_dashed(&self) -> bool {
            matches!(self.stroke, StrokeStyle::Dashed { .. })
        }

        #[inline]
        pub fn is_mesh(&self) -> bool {
            matches!(self.shape, PrimitiveShape::TriangleMesh { .. })
        }
    }

    pub fn line_distances(points: &[Point3]) -> Vec<f64> {
        let mut distances = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (index, point) in points.iter().enumerate() {
            if index > 0 {
                total += points[index - 1].distance(*point);
            }
            distances.push(total);
        }
        distances
    }

    /// 场景图返回的图元句柄。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    pub struct PrimitiveHandle(u64);

    impl PrimitiveHandle {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct MaterialStyle {
        pub line_color: Rgb,
        pub face_color: Rgb,
        pub dash_size: f64,
        pub gap_size: f64,
    }

    impl Default for MaterialStyle {
        fn default() -> Self {
            Self {
                line_color: Rgb::WHITE,
                face_color: Rgb::new(0x88, 0x88, 0x88),
                dash_size: 3.0,
                gap_size: 1.0,
            }
        }
    }
}

pub mod camera {
    use serde::{Deserialize, Serialize};

    use crate::geometry::Point3;

    /// 宿主容器的像素尺寸。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct ViewportSize {
        pub width: f64,
        pub height: f64,
    }

    impl ViewportSize {
        #[inline]
        pub fn new(width: f64, height: f64) -> Self {
            Self { width, height }
        }

        /// 尚未布局（零面积或非有限值）的容器视为不存在。
        #[inline]
        pub fn is_degenerate(&self) -> bool {
            !(self.width.is_finite() && self.height.is_finite())
                || self.width <= 0.0
                || self.height <= 0.0
        }
    }

    /// 正交相机位姿与投影范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct CameraPose {
        pub position: Point3,
        pub target: Point3,
        pub zoom: f64,
        pub left: f64,
        pub right: f64,
        pub top: f64,
        pub bottom: f64,
        pub near: f64,
        pub far: f64,
    }

    impl CameraPose {
        pub const DEFAULT_NEAR: f64 = 0.1;
        pub const DEFAULT_FAR: f64 = 1_000.0;
        pub const DEFAULT_Z: f64 = 10.0;

        pub fn looking_at(position: Point3, target: Point3) -> Self {
            Self {
                position,
                target,
                ..Self::default()
            }
        }

        /// 以 0 为中心对称地设置正交投影的左右上下范围。
        pub fn set_extents(&mut self, size: ViewportSize) {
            let half_width = size.width / 2.0;
            let half_height = size.height / 2.0;
            self.left = -half_width;
            self.right = half_width;
            self.top = half_height;
            self.bottom = -half_height;
        }

        #[inline]
        pub fn visible_width(&self) -> f64 {
            (self.right - self.left) / self.zoom
        }

        #[inline]
        pub fn visible_height(&self) -> f64 {
            (self.top - self.bottom) / self.zoom
        }
    }

    impl Default for CameraPose {
        fn default() -> Self {
            Self {
                position: Point3::new(0.0, 0.0, Self::DEFAULT_Z),
                target: Point3::ORIGIN,
                zoom: 1.0,
                left: -1.0,
                right: 1.0,
                top: 1.0,
                bottom: -1.0,
                near: Self::DEFAULT_NEAR,
                far: Self::DEFAULT_FAR,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::camera::{CameraPose, ViewportSize};
    use super::color::Rgb;
    use super::entity::{EntityKind, ParsedEntity, RawPoint};
    use super::geometry::{Bounds3D, Point3};
    use super::primitive::{RenderPrimitiveSpec, StrokeStyle, line_distances};

    #[test]
    fn bounds_start_empty_and_grow() {
        let mut bounds = Bounds3D::empty();
        assert!(bounds.is_empty());
        assert!(!bounds.contains(Point3::ORIGIN));

        bounds.include_point(Point3::new(1.0, -2.0, 0.5));
        assert!(!bounds.is_empty());
        assert_eq!(bounds.min(), bounds.max());

        bounds.include_points([Point3::new(-3.0, 4.0, 0.0), Point3::new(0.0, 0.0, 2.0)]);
        assert_eq!(bounds.min(), Point3::new(-3.0, -2.0, 0.0));
        assert_eq!(bounds.max(), Point3::new(1.0, 4.0, 2.0));
        assert_eq!(bounds.center(), Point3::new(-1.0, 1.0, 1.0));
        assert!(bounds.contains(Point3::new(0.0, 0.0, 1.0)));
        assert!(!bounds.contains(Point3::new(0.0, 5.0, 1.0)));

        let mut merged = Bounds3D::empty();
        merged.include_bounds(&Bounds3D::empty());
        assert!(merged.is_empty());
        merged.include_bounds(&bounds);
        assert_eq!(merged, bounds);
    }

    #[test]
    fn raw_point_lift_defaults_z_and_rejects_missing_xy() {
        assert_eq!(RawPoint::xy(1.0, 2.0).lift(), Some(Point3::new(1.0, 2.0, 0.0)));
        assert_eq!(
            RawPoint::xyz(1.0, 2.0, 3.0).lift(),
            Some(Point3::new(1.0, 2.0, 3.0))
        );
        let missing_y = RawPoint {
            x: Some(1.0),
            y: None,
            z: Some(1.0),
        };
        assert!(missing_y.lift().is_none());
        assert!(RawPoint::xy(f64::NAN, 0.0).lift().is_none());
        assert!(RawPoint::default().is_unset());
    }

    #[test]
    fn rgb_parses_hex_forms() {
        assert_eq!("#ff8000".parse::<Rgb>().unwrap(), Rgb::new(255, 128, 0));
        assert_eq!("0x000000".parse::<Rgb>().unwrap(), Rgb::BLACK);
        assert_eq!("FFFFFF".parse::<Rgb>().unwrap(), Rgb::WHITE);
        assert!("#fff".parse::<Rgb>().is_err());
        assert!("#gg0000".parse::<Rgb>().is_err());
        assert_eq!(Rgb::new(1, 2, 255).to_string(), "#0102ff");
    }

    #[test]
    fn entity_kind_round_trips_tags() {
        for tag in ["LINE", "ARC", "CIRCLE", "SPLINE", "LWPOLYLINE", "POLYLINE", "3DFACE", "SOLID"] {
            let kind = EntityKind::from_tag(tag).expect("known tag");
            assert_eq!(kind.tag(), tag);
        }
        assert!(EntityKind::from_tag("HATCH").is_none());

        let unknown = ParsedEntity::Unrecognized {
            kind: "HATCH".to_string(),
        };
        assert_eq!(unknown.type_tag(), "HATCH");
        assert!(unknown.kind().is_none());
        assert!(unknown.layer_name().is_none());
    }

    #[test]
    fn dashed_primitive_carries_cumulative_distances() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 4.0, 0.0),
            Point3::new(3.0, 4.0, 2.0),
        ];
        assert_eq!(line_distances(&points), vec![0.0, 5.0, 7.0]);

        let spec = RenderPrimitiveSpec::line_strip(EntityKind::Line, "0", points).dashed();
        assert!(spec.is_dashed());
        match spec.stroke {
            StrokeStyle::Dashed { line_distances } => assert_eq!(line_distances.len(), 3),
            StrokeStyle::Solid => panic!("expected dashed stroke"),
        }
    }

    #[test]
    fn camera_extents_follow_viewport_size() {
        let mut camera = CameraPose::default();
        camera.set_extents(ViewportSize::new(800.0, 600.0));
        assert_eq!(camera.left, -400.0);
        assert_eq!(camera.right, 400.0);
        assert_eq!(camera.top, 300.0);
        assert_eq!(camera.bottom, -300.0);
        assert_eq!(camera.visible_width(), 800.0);
        camera.zoom = 2.0;
        assert_eq!(camera.visible_height(), 300.0);

        assert!(ViewportSize::new(0.0, 10.0).is_degenerate());
        assert!(!ViewportSize::new(1.0, 1.0).is_degenerate());
    }
}

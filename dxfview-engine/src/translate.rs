use tracing::{debug, trace};

use dxfview_core::entity::{
    ArcEntity, CircleEntity, EntityKind, FaceEntity, LineEntity, ParsedEntity, PolylineEntity,
    RawPoint, SplineEntity,
};
use dxfview_core::geometry::{Bounds3D, Point3};
use dxfview_core::primitive::RenderPrimitiveSpec;

use crate::errors::EntityError;
use crate::sampling::{CatmullRomCurve, sample_arc, sample_circle};

pub const ARC_SEGMENTS: usize = 32;
pub const CIRCLE_SEGMENTS: usize = 64;
pub const SPLINE_SEGMENTS: usize = 128;

const DASHED_LINE_TYPE: &str = "dashed";

/// 一次转换的结果。`bounds` 只包含实际产出图元的点，未产出任何图元时为空。
#[derive(Debug, Clone, Default)]
pub struct Translation {
    pub primitives: Vec<RenderPrimitiveSpec>,
    pub bounds: Bounds3D,
    /// 因字段缺失或取值非法被跳过的实体数。
    pub skipped: usize,
    pub unrecognized: usize,
}

impl Translation {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    #[inline]
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }
}

/// 按输入顺序把实体序列转换为图元描述并累积包围盒。
///
/// 单个实体出错只会跳过该实体；未识别的类型标记静默忽略。
pub fn translate(entities: &[ParsedEntity]) -> Translation {
    let mut translation = Translation::default();
    for (index, entity) in entities.iter().enumerate() {
        match translate_entity(entity) {
            Ok(Some(primitive)) => {
                translation
                    .bounds
                    .include_points(primitive.points.iter().copied());
                translation.primitives.push(primitive);
            }
            Ok(None) => {
                trace!(index, kind = entity.type_tag(), "忽略未识别的实体类型");
                translation.unrecognized += 1;
            }
            Err(err) => {
                debug!(index, kind = entity.type_tag(), error = %err, "跳过无效实体");
                translation.skipped += 1;
            }
        }
    }
    debug!(
        primitives = translation.primitives.len(),
        skipped = translation.skipped,
        unrecognized = translation.unrecognized,
        "实体转换完成"
    );
    translation
}

/// 转换单个实体；`Ok(None)` 表示未识别的类型。
pub fn translate_entity(entity: &ParsedEntity) -> Result<Option<RenderPrimitiveSpec>, EntityError> {
    let primitive = match entity {
        ParsedEntity::Line(line) => line_primitive(line)?,
        ParsedEntity::Arc(arc) => arc_primitive(arc)?,
        ParsedEntity::Circle(circle) => circle_primitive(circle)?,
        ParsedEntity::Spline(spline) => spline_primitive(spline)?,
        ParsedEntity::Polyline(polyline) => {
            let kind = entity.kind().unwrap_or(EntityKind::LwPolyline);
            polyline_primitive(kind, polyline)?
        }
        ParsedEntity::Face(face) => {
            let kind = entity.kind().unwrap_or(EntityKind::Face3D);
            face_primitive(kind, face)?
        }
        ParsedEntity::Unrecognized { .. } => return Ok(None),
    };
    Ok(Some(primitive))
}

fn line_primitive(line: &LineEntity) -> Result<RenderPrimitiveSpec, EntityError> {
    let kind = EntityKind::Line;
    let (start, end) = if line.start.is_some() || line.end.is_some() {
        (
            lift(kind, "start", line.start.as_ref())?,
            lift(kind, "end", line.end.as_ref())?,
        )
    } else {
        if line.vertices.len() < 2 {
            return Err(EntityError::TooFewPoints {
                kind,
                required: 2,
                actual: line.vertices.len(),
            });
        }
        (
            lift(kind, "vertices", line.vertices.first())?,
            lift(kind, "vertices", line.vertices.get(1))?,
        )
    };

    let primitive = RenderPrimitiveSpec::line_strip(kind, &line.layer, vec![start, end]);
    Ok(apply_line_type(primitive, line.line_type.as_deref()))
}

fn arc_primitive(arc: &ArcEntity) -> Result<RenderPrimitiveSpec, EntityError> {
    let kind = EntityKind::Arc;
    let center = lift(kind, "center", arc.center.as_ref())?;
    let radius = radius(kind, arc.radius)?;
    let start_angle = finite(kind, "start_angle", arc.start_angle)?;
    let end_angle = finite(kind, "end_angle", arc.end_angle)?;
    let points = sample_arc(center, radius, start_angle, end_angle, ARC_SEGMENTS);
    Ok(RenderPrimitiveSpec::line_strip(kind, &arc.layer, points))
}

fn circle_primitive(circle: &CircleEntity) -> Result<RenderPrimitiveSpec, EntityError> {
    let kind = EntityKind::Circle;
    let center = lift(kind, "center", circle.center.as_ref())?;
    let radius = radius(kind, circle.radius)?;
    let points = sample_circle(center, radius, CIRCLE_SEGMENTS);
    Ok(RenderPrimitiveSpec::line_loop(kind, &circle.layer, points))
}

fn spline_primitive(spline: &SplineEntity) -> Result<RenderPrimitiveSpec, EntityError> {
    let kind = EntityKind::Spline;
    // 只有拟合点的样条退而使用拟合点
    let source = if spline.control_points.len() < 2 && spline.fit_points.len() >= 2 {
        &spline.fit_points
    } else {
        &spline.control_points
    };
    let controls = lift_all(kind, "control_points", source)?;
    let curve = CatmullRomCurve::new(&controls).ok_or(EntityError::TooFewPoints {
        kind,
        required: 2,
        actual: controls.len(),
    })?;
    Ok(RenderPrimitiveSpec::line_strip(
        kind,
        &spline.layer,
        curve.sample(SPLINE_SEGMENTS),
    ))
}

fn polyline_primitive(
    kind: EntityKind,
    polyline: &PolylineEntity,
) -> Result<RenderPrimitiveSpec, EntityError> {
    let mut points = lift_all(kind, "vertices", &polyline.vertices)?;
    if points.len() < 2 {
        return Err(EntityError::TooFewPoints {
            kind,
            required: 2,
            actual: points.len(),
        });
    }
    if polyline.closed {
        points.push(points[0]);
    }
    let primitive = RenderPrimitiveSpec::line_strip(kind, &polyline.layer, points);
    Ok(apply_line_type(primitive, polyline.line_type.as_deref()))
}

fn face_primitive(kind: EntityKind, face: &FaceEntity) -> Result<RenderPrimitiveSpec, EntityError> {
    let mut points: Vec<Point3> = face.vertices.iter().filter_map(RawPoint::lift).collect();
    if points.len() < 3 {
        return Err(EntityError::TooFewPoints {
            kind,
            required: 3,
            actual: points.len(),
        });
    }
    points.truncate(4);

    // 第 4 点与第 3 点重合即退化四边形，按三角形处理
    let indices = if points.len() == 4 && points[3] != points[2] {
        vec![0, 1, 2, 0, 2, 3]
    } else {
        points.truncate(3);
        vec![0, 1, 2]
    };
    Ok(RenderPrimitiveSpec::mesh(kind, &face.layer, points, indices))
}

fn apply_line_type(primitive: RenderPrimitiveSpec, line_type: Option<&str>) -> RenderPrimitiveSpec {
    let dashed =
        line_type.is_some_and(|name| name.trim().eq_ignore_ascii_case(DASHED_LINE_TYPE));
    if dashed { primitive.dashed() } else { primitive }
}

fn lift(
    kind: EntityKind,
    field: &'static str,
    point: Option<&RawPoint>,
) -> Result<Point3, EntityError> {
    point
        .and_then(RawPoint::lift)
        .ok_or(EntityError::MissingField { kind, field })
}

fn lift_all(
    kind: EntityKind,
    field: &'static str,
    points: &[RawPoint],
) -> Result<Vec<Point3>, EntityError> {
    points
        .iter()
        .map(|point| lift(kind, field, Some(point)))
        .collect()
}

fn finite(kind: EntityKind, field: &'static str, value: Option<f64>) -> Result<f64, EntityError> {
    let value = value.ok_or(EntityError::MissingField { kind, field })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EntityError::InvalidValue { kind, field, value })
    }
}

fn radius(kind: EntityKind, value: Option<f64>) -> Result<f64, EntityError> {
    let value = finite(kind, "radius", value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(EntityError::InvalidValue {
            kind,
            field: "radius",
            value,
        })
    }
}

use std::f64::consts::TAU;

use glam::DVec3;

use dxfview_core::geometry::Point3;

const ANGLE_EPSILON: f64 = 1e-9;
/// 向心参数化下相邻点间距过小时的退化阈值。
const KNOT_EPSILON: f64 = 1e-4;

/// 在逆时针方向上从 `start_angle` 扫到 `end_angle`，均匀取 `segments` 段（含两端共 `segments + 1` 个点）。
///
/// 终止角小于起始角时跨越 0 度；两者重合视为整圆。
pub fn sample_arc(
    center: Point3,
    radius: f64,
    start_angle: f64,
    end_angle: f64,
    segments: usize,
) -> Vec<Point3> {
    let segments = segments.max(1);
    let (start, end) = canonical_angle_range(start_angle, end_angle);
    let span = end - start;
    let mut points = Vec::with_capacity(segments + 1);
    for i in 0..=segments {
        let angle = start + span * (i as f64 / segments as f64);
        points.push(point_on_circle(center, radius, angle));
    }
    points
}

/// 整圆采样：`segments` 个等分点加一个与首点完全相同的闭合点。
pub fn sample_circle(center: Point3, radius: f64, segments: usize) -> Vec<Point3> {
    let segments = segments.max(3);
    let mut points = Vec::with_capacity(segments + 1);
    for i in 0..segments {
        let angle = TAU * (i as f64) / (segments as f64);
        points.push(point_on_circle(center, radius, angle));
    }
    if let Some(first) = points.first().copied() {
        points.push(first);
    }
    points
}

fn canonical_angle_range(start: f64, end: f64) -> (f64, f64) {
    let start = normalize_angle(start);
    let mut end = normalize_angle(end);
    if (end - start).abs() < ANGLE_EPSILON {
        end = start + TAU;
    } else if end < start {
        end += TAU;
    }
    (start, end)
}

fn normalize_angle(angle: f64) -> f64 {
    let mut result = angle % TAU;
    if result < 0.0 {
        result += TAU;
    }
    result
}

fn point_on_circle(center: Point3, radius: f64, angle: f64) -> Point3 {
    Point3::new(
        center.x() + radius * angle.cos(),
        center.y() + radius * angle.sin(),
        center.z(),
    )
}

/// 非闭合的向心 Catmull–Rom 曲线，穿过全部控制点。
/// 首尾两端通过镜像相邻点外推出虚拟控制点。
#[derive(Debug, Clone)]
pub struct CatmullRomCurve {
    points: Vec<DVec3>,
}

impl CatmullRomCurve {
    /// 少于两个点时无法构成曲线，返回 `None`。
    pub fn new(points: &[Point3]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        Some(Self {
            points: points.iter().map(|point| point.as_vec3()).collect(),
        })
    }

    /// 在 `t ∈ [0, 1]` 处求值。
    pub fn point_at(&self, t: f64) -> Point3 {
        let points = &self.points;
        let count = points.len();
        let scaled = (count - 1) as f64 * t.clamp(0.0, 1.0);
        let mut index = scaled.floor() as usize;
        let mut weight = scaled - index as f64;
        if index >= count - 1 {
            index = count - 2;
            weight = 1.0;
        }

        let p1 = points[index];
        let p2 = points[index + 1];
        let p0 = if index > 0 {
            points[index - 1]
        } else {
            p1 * 2.0 - p2
        };
        let p3 = if index + 2 < count {
            points[index + 2]
        } else {
            p2 * 2.0 - p1
        };

        let mut dt1 = p1.distance_squared(p2).powf(0.25);
        let mut dt0 = p0.distance_squared(p1).powf(0.25);
        let mut dt2 = p2.distance_squared(p3).powf(0.25);
        if dt1 < KNOT_EPSILON {
            dt1 = 1.0;
        }
        if dt0 < KNOT_EPSILON {
            dt0 = dt1;
        }
        if dt2 < KNOT_EPSILON {
            dt2 = dt1;
        }

        let t1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
        let t2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;

        let c0 = p1;
        let c1 = t1;
        let c2 = p1 * -3.0 + p2 * 3.0 - t1 * 2.0 - t2;
        let c3 = p1 * 2.0 - p2 * 2.0 + t1 + t2;
        let w2 = weight * weight;
        let w3 = w2 * weight;
        Point3::from_vec(c0 + c1 * weight + c2 * w2 + c3 * w3)
    }

    /// 均匀参数步长采样 `divisions` 段，返回 `divisions + 1` 个点。
    pub fn sample(&self, divisions: usize) -> Vec<Point3> {
        let divisions = divisions.max(1);
        (0..=divisions)
            .map(|i| self.point_at(i as f64 / divisions as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use super::*;

    fn close(a: Point3, b: Point3) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn arc_is_inclusive_of_both_ends() {
        let center = Point3::new(1.0, 1.0, 2.0);
        let points = sample_arc(center, 2.0, 0.0, FRAC_PI_2, 32);
        assert_eq!(points.len(), 33);
        assert!(close(points[0], Point3::new(3.0, 1.0, 2.0)));
        assert!(close(points[32], Point3::new(1.0, 3.0, 2.0)));
        assert!(points.iter().all(|p| (p.z() - 2.0).abs() < f64::EPSILON));
    }

    #[test]
    fn arc_wraps_when_end_precedes_start() {
        let points = sample_arc(Point3::ORIGIN, 1.0, 3.0 * FRAC_PI_2, FRAC_PI_2, 4);
        // 从 270° 逆时针经 0° 到 90°
        assert!(close(points[0], Point3::new(0.0, -1.0, 0.0)));
        assert!(close(points[2], Point3::new(1.0, 0.0, 0.0)));
        assert!(close(points[4], Point3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn arc_with_equal_angles_is_full_turn() {
        let points = sample_arc(Point3::ORIGIN, 1.0, PI, PI, 4);
        assert!(close(points[0], points[4]));
        assert!(close(points[2], Point3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn circle_closes_on_first_point() {
        let points = sample_circle(Point3::ORIGIN, 2.0, 64);
        assert_eq!(points.len(), 65);
        assert_eq!(points.first(), points.last());
        for point in &points {
            assert!((point.distance(Point3::ORIGIN) - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn catmull_rom_passes_through_control_points() {
        let controls = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(3.0, 2.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        ];
        let curve = CatmullRomCurve::new(&controls).expect("curve");
        assert!(close(curve.point_at(0.0), controls[0]));
        assert!(close(curve.point_at(1.0 / 3.0), controls[1]));
        assert!(close(curve.point_at(2.0 / 3.0), controls[2]));
        assert!(close(curve.point_at(1.0), controls[3]));

        let samples = curve.sample(128);
        assert_eq!(samples.len(), 129);
        assert!(close(samples[0], controls[0]));
        assert!(close(samples[128], controls[3]));
    }

    #[test]
    fn two_point_catmull_rom_is_straight() {
        let curve = CatmullRomCurve::new(&[Point3::ORIGIN, Point3::new(2.0, 0.0, 0.0)]).unwrap();
        for sample in curve.sample(8) {
            assert!(sample.y().abs() < 1e-9);
            assert!(sample.x() >= -1e-9 && sample.x() <= 2.0 + 1e-9);
        }
        assert!(CatmullRomCurve::new(&[Point3::ORIGIN]).is_none());
    }

    #[test]
    fn coincident_control_points_do_not_produce_nan() {
        let curve = CatmullRomCurve::new(&[Point3::ORIGIN, Point3::ORIGIN, Point3::new(1.0, 1.0, 0.0)])
            .unwrap();
        assert!(curve.sample(16).iter().all(|p| p.as_vec3().is_finite()));
    }
}

use thiserror::Error;
use tracing::{debug, trace};

use dxfview_core::entity::{
    ArcEntity, CircleEntity, DEFAULT_LAYER, FaceEntity, FaceKind, LineEntity, ParsedDocument,
    ParsedEntity, PolylineEntity, PolylineKind, RawPoint, SplineEntity,
};

const BINARY_SENTINEL: &str = "AutoCAD Binary DXF";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("文档内容为空")]
    Empty,
    #[error("不支持的文档格式：{0}")]
    Unsupported(String),
    #[error("DXF 结构错误（第 {line} 行）：{message}")]
    Invalid { line: usize, message: String },
}

/// 文本解析协作者：给定原始文档文本，返回实体序列。
pub trait DocumentParser {
    fn parse(&self, text: &str) -> Result<ParsedDocument, ParseError>;
}

/// 仅识别 ENTITIES 段中七类实体的组码解析器，其余实体按类型标记保留为 `Unrecognized`。
///
/// 单个实体的数值字段无法解析时只留空该字段，由转换阶段决定是否跳过；
/// 只有组码/值行结构损坏才会使整份文档解析失败。
#[derive(Debug, Default, Clone, Copy)]
pub struct DxfTextParser;

impl DxfTextParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for DxfTextParser {
    fn parse(&self, text: &str) -> Result<ParsedDocument, ParseError> {
        let text = text.trim_start_matches('\u{feff}');
        if text.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        if text.starts_with(BINARY_SENTINEL) {
            return Err(ParseError::Unsupported("binary DXF".to_string()));
        }
        let document = DxfParser::new(text).parse()?;
        debug!(
            entities = document.len(),
            recognized = document.recognized_count(),
            "DXF 文本解析完成"
        );
        Ok(document)
    }
}

struct DxfParser<'a> {
    reader: DxfReader<'a>,
}

impl<'a> DxfParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            reader: DxfReader::new(source),
        }
    }

    fn parse(mut self) -> Result<ParsedDocument, ParseError> {
        let mut document = ParsedDocument::new();
        while let Some((code, value)) = self.reader.next_pair()? {
            if code != 0 {
                return Err(self.reader.invalid(format!(
                    "意外的组码 {code}（期望 0 表示 SECTION/EOF）"
                )));
            }
            match value.trim() {
                "SECTION" => {
                    let (name_code, name) = self
                        .reader
                        .next_pair()?
                        .ok_or_else(|| self.reader.invalid("SECTION 缺少名称（组码 2）"))?;
                    if name_code != 2 {
                        return Err(self.reader.invalid(format!(
                            "SECTION 名称使用了组码 {name_code}（期望 2）"
                        )));
                    }
                    match name.trim() {
                        "ENTITIES" => self.parse_entities(&mut document)?,
                        other => {
                            trace!(section = other, "跳过 SECTION");
                            self.skip_section()?;
                        }
                    }
                }
                "EOF" => break,
                unexpected => {
                    return Err(self.reader.invalid(format!(
                        "意外的标记 {unexpected}，期望 SECTION 或 EOF"
                    )));
                }
            }
        }
        Ok(document)
    }

    fn skip_section(&mut self) -> Result<(), ParseError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) if value.trim() == "ENDSEC" => return Ok(()),
                Some(_) => continue,
                None => return Err(self.reader.invalid("SECTION 未找到 ENDSEC 终止标记")),
            }
        }
    }

    fn parse_entities(&mut self, document: &mut ParsedDocument) -> Result<(), ParseError> {
        loop {
            let (code, value) = match self.reader.next_pair()? {
                Some(pair) => pair,
                None => return Err(self.reader.invalid("ENTITIES 段提前结束")),
            };
            if code != 0 {
                return Err(self.reader.invalid(format!(
                    "ENTITIES 段遇到组码 {code}（期望 0 表示实体起始）"
                )));
            }

            let entity = match value.trim() {
                "ENDSEC" => break,
                "LINE" => self.parse_line()?,
                "CIRCLE" => self.parse_circle()?,
                "ARC" => self.parse_arc()?,
                "SPLINE" => self.parse_spline()?,
                "LWPOLYLINE" => self.parse_lwpolyline()?,
                "POLYLINE" => self.parse_polyline()?,
                "3DFACE" => self.parse_face(FaceKind::Face3D)?,
                "SOLID" => self.parse_face(FaceKind::Solid)?,
                // 孤立的 VERTEX/SEQEND 不构成独立实体
                "VERTEX" | "SEQEND" => {
                    self.skip_entity_body()?;
                    continue;
                }
                other => {
                    self.skip_entity_body()?;
                    ParsedEntity::Unrecognized {
                        kind: other.to_string(),
                    }
                }
            };
            document.push(entity);
        }
        Ok(())
    }

    /// 逐个读取实体体内的组码，遇到下一个组码 0 时回退并结束。
    fn for_each_group<F>(&mut self, mut handle: F) -> Result<(), ParseError>
    where
        F: FnMut(i32, &str),
    {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    return Ok(());
                }
                Some((code, value)) => handle(code, &value),
                None => return Ok(()),
            }
        }
    }

    fn parse_line(&mut self) -> Result<ParsedEntity, ParseError> {
        let mut line = LineEntity {
            layer: DEFAULT_LAYER.to_string(),
            ..LineEntity::default()
        };
        let mut start = RawPoint::default();
        let mut end = RawPoint::default();
        self.for_each_group(|code, value| match code {
            6 => line.line_type = Some(value.trim().to_string()),
            8 => line.layer = value.trim().to_string(),
            10 => start.x = number(value, "LINE 起点 X"),
            20 => start.y = number(value, "LINE 起点 Y"),
            30 => start.z = number(value, "LINE 起点 Z"),
            11 => end.x = number(value, "LINE 终点 X"),
            21 => end.y = number(value, "LINE 终点 Y"),
            31 => end.z = number(value, "LINE 终点 Z"),
            _ => {}
        })?;
        line.start = (!start.is_unset()).then_some(start);
        line.end = (!end.is_unset()).then_some(end);
        Ok(ParsedEntity::Line(line))
    }

    fn parse_circle(&mut self) -> Result<ParsedEntity, ParseError> {
        let mut circle = CircleEntity {
            layer: DEFAULT_LAYER.to_string(),
            ..CircleEntity::default()
        };
        let mut center = RawPoint::default();
        self.for_each_group(|code, value| match code {
            8 => circle.layer = value.trim().to_string(),
            10 => center.x = number(value, "CIRCLE 圆心 X"),
            20 => center.y = number(value, "CIRCLE 圆心 Y"),
            30 => center.z = number(value, "CIRCLE 圆心 Z"),
            40 => circle.radius = number(value, "CIRCLE 半径"),
            _ => {}
        })?;
        circle.center = (!center.is_unset()).then_some(center);
        Ok(ParsedEntity::Circle(circle))
    }

    fn parse_arc(&mut self) -> Result<ParsedEntity, ParseError> {
        let mut arc = ArcEntity {
            layer: DEFAULT_LAYER.to_string(),
            ..ArcEntity::default()
        };
        let mut center = RawPoint::default();
        self.for_each_group(|code, value| match code {
            8 => arc.layer = value.trim().to_string(),
            10 => center.x = number(value, "ARC 圆心 X"),
            20 => center.y = number(value, "ARC 圆心 Y"),
            30 => center.z = number(value, "ARC 圆心 Z"),
            40 => arc.radius = number(value, "ARC 半径"),
            // DXF 中角度以度存储
            50 => arc.start_angle = number(value, "ARC 起始角").map(f64::to_radians),
            51 => arc.end_angle = number(value, "ARC 终止角").map(f64::to_radians),
            _ => {}
        })?;
        arc.center = (!center.is_unset()).then_some(center);
        Ok(ParsedEntity::Arc(arc))
    }

    fn parse_spline(&mut self) -> Result<ParsedEntity, ParseError> {
        let mut spline = SplineEntity {
            layer: DEFAULT_LAYER.to_string(),
            ..SplineEntity::default()
        };
        let mut control = PointList::default();
        let mut fit = PointList::default();
        self.for_each_group(|code, value| match code {
            8 => spline.layer = value.trim().to_string(),
            70 => {
                if let Some(flags) = integer(value, "SPLINE 类型标志") {
                    spline.closed = flags & 0x01 != 0;
                }
            }
            10 => control.start_with_x(number(value, "SPLINE 控制点 X")),
            20 => control.set_y(number(value, "SPLINE 控制点 Y")),
            30 => control.set_z(number(value, "SPLINE 控制点 Z")),
            11 => fit.start_with_x(number(value, "SPLINE 拟合点 X")),
            21 => fit.set_y(number(value, "SPLINE 拟合点 Y")),
            31 => fit.set_z(number(value, "SPLINE 拟合点 Z")),
            _ => {}
        })?;
        spline.control_points = control.into_points();
        spline.fit_points = fit.into_points();
        Ok(ParsedEntity::Spline(spline))
    }

    fn parse_lwpolyline(&mut self) -> Result<ParsedEntity, ParseError> {
        let mut polyline = PolylineEntity {
            layer: DEFAULT_LAYER.to_string(),
            kind: PolylineKind::Light,
            ..PolylineEntity::default()
        };
        let mut vertices = PointList::default();
        let mut elevation = None;
        self.for_each_group(|code, value| match code {
            6 => polyline.line_type = Some(value.trim().to_string()),
            8 => polyline.layer = value.trim().to_string(),
            38 => elevation = number(value, "LWPOLYLINE 标高"),
            70 => {
                if let Some(flags) = integer(value, "LWPOLYLINE 标志") {
                    polyline.closed = flags & 0x01 != 0;
                }
            }
            10 => vertices.start_with_x(number(value, "LWPOLYLINE 顶点 X")),
            20 => vertices.set_y(number(value, "LWPOLYLINE 顶点 Y")),
            _ => {}
        })?;
        let mut points = vertices.into_points();
        if let Some(z) = elevation {
            for point in &mut points {
                point.z = Some(z);
            }
        }
        polyline.vertices = points;
        Ok(ParsedEntity::Polyline(polyline))
    }

    /// 旧式 POLYLINE：头部之后跟随若干 VERTEX，直到 SEQEND。
    fn parse_polyline(&mut self) -> Result<ParsedEntity, ParseError> {
        let mut polyline = PolylineEntity {
            layer: DEFAULT_LAYER.to_string(),
            kind: PolylineKind::Heavy,
            ..PolylineEntity::default()
        };
        self.for_each_group(|code, value| match code {
            6 => polyline.line_type = Some(value.trim().to_string()),
            8 => polyline.layer = value.trim().to_string(),
            70 => {
                if let Some(flags) = integer(value, "POLYLINE 标志") {
                    polyline.closed = flags & 0x01 != 0;
                }
            }
            _ => {}
        })?;

        loop {
            let Some((code, value)) = self.reader.next_pair()? else {
                return Err(self.reader.invalid("POLYLINE 缺少 SEQEND"));
            };
            debug_assert_eq!(code, 0);
            match value.trim() {
                "VERTEX" => {
                    let mut vertex = RawPoint::default();
                    let mut flags = 0;
                    self.for_each_group(|code, value| match code {
                        10 => vertex.x = number(value, "VERTEX X"),
                        20 => vertex.y = number(value, "VERTEX Y"),
                        30 => vertex.z = number(value, "VERTEX Z"),
                        70 => flags = integer(value, "VERTEX 标志").unwrap_or(0),
                        _ => {}
                    })?;
                    // 多面网格的面记录只含索引，不是几何顶点
                    if flags & 0x80 != 0 && flags & 0x40 == 0 {
                        continue;
                    }
                    polyline.vertices.push(vertex);
                }
                "SEQEND" => {
                    self.skip_entity_body()?;
                    break;
                }
                _ => {
                    // 缺失 SEQEND 的文件：把实体标记交还给外层循环
                    self.reader.put_back((code, value));
                    break;
                }
            }
        }
        Ok(ParsedEntity::Polyline(polyline))
    }

    fn parse_face(&mut self, kind: FaceKind) -> Result<ParsedEntity, ParseError> {
        let mut face = FaceEntity {
            layer: DEFAULT_LAYER.to_string(),
            kind,
            vertices: Vec::new(),
        };
        let mut slots = [RawPoint::default(); 4];
        self.for_each_group(|code, value| match code {
            8 => face.layer = value.trim().to_string(),
            10..=13 => slots[(code - 10) as usize].x = number(value, "面顶点 X"),
            20..=23 => slots[(code - 20) as usize].y = number(value, "面顶点 Y"),
            30..=33 => slots[(code - 30) as usize].z = number(value, "面顶点 Z"),
            _ => {}
        })?;
        face.vertices = slots.into_iter().filter(|slot| !slot.is_unset()).collect();
        Ok(ParsedEntity::Face(face))
    }

    fn skip_entity_body(&mut self) -> Result<(), ParseError> {
        self.for_each_group(|_, _| {})
    }
}

/// 以 X 组码开启新点、Y/Z 组码补全最近一个点的累积器。
#[derive(Default)]
struct PointList {
    points: Vec<RawPoint>,
}

impl PointList {
    fn start_with_x(&mut self, x: Option<f64>) {
        self.points.push(RawPoint {
            x,
            y: None,
            z: None,
        });
    }

    fn set_y(&mut self, y: Option<f64>) {
        match self.points.last_mut() {
            Some(point) if point.y.is_none() => point.y = y,
            _ => self.points.push(RawPoint { x: None, y, z: None }),
        }
    }

    fn set_z(&mut self, z: Option<f64>) {
        if let Some(point) = self.points.last_mut() {
            point.z = z;
        }
    }

    fn into_points(self) -> Vec<RawPoint> {
        self.points
    }
}

struct DxfReader<'a> {
    lines: std::str::Lines<'a>,
    buffer: Option<(i32, String)>,
    line_number: usize,
}

impl<'a> DxfReader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            buffer: None,
            line_number: 0,
        }
    }

    fn next_pair(&mut self) -> Result<Option<(i32, String)>, ParseError> {
        if let Some(pair) = self.buffer.take() {
            return Ok(Some(pair));
        }

        let code_line = loop {
            match self.lines.next() {
                Some(line) => {
                    self.line_number += 1;
                    // 文件末尾常见的空行不计入组码
                    if line.trim().is_empty() {
                        continue;
                    }
                    break line;
                }
                None => return Ok(None),
            }
        };

        let value_line = match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => {
                return Err(self.invalid(format!(
                    "文件在第 {} 行结束，缺少与组码对应的值行",
                    self.line_number
                )));
            }
        };

        let code = code_line.trim().parse::<i32>().map_err(|_| ParseError::Invalid {
            line: self.line_number - 1,
            message: format!("组码 \"{}\" 无法解析为整数", code_line.trim()),
        })?;
        let value = value_line.trim_end_matches('\r').to_string();
        Ok(Some((code, value)))
    }

    fn put_back(&mut self, pair: (i32, String)) {
        debug_assert!(self.buffer.is_none(), "DXF pair 只能回退一次");
        self.buffer = Some(pair);
    }

    fn invalid(&self, message: impl Into<String>) -> ParseError {
        ParseError::Invalid {
            line: self.line_number,
            message: message.into(),
        }
    }
}

fn number(raw: &str, context: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            trace!(context, value = raw, "数值字段解析失败，留空");
            None
        }
    }
}

fn integer(raw: &str, context: &str) -> Option<i32> {
    match raw.trim().parse::<i32>() {
        Ok(value) => Some(value),
        Err(_) => {
            trace!(context, value = raw, "整数字段解析失败，忽略");
            None
        }
    }
}

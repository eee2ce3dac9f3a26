use std::fmt::Write as _;

use tokio::sync::watch;
use tracing::{error, info};

use dxfview_config::AppConfig;
use dxfview_core::camera::ViewportSize;
use dxfview_core::geometry::Point3;
use dxfview_engine::navigation::PanZoomController;
use dxfview_engine::scene::MemoryScene;
use dxfview_io::DxfTextParser;

use crate::errors::FrontendError;
use crate::frame_loop::{FrameLoopConfig, run_frame_loop};
use crate::loader::{DocumentLoader, SourceReference};
use crate::viewer::{LoadReport, LoadStatus, Viewer};
use crate::viewport_options;

/// 无头模式使用的视口组合。
pub type HeadlessViewer = Viewer<MemoryScene, PanZoomController, DocumentLoader, DxfTextParser>;

/// CLI 运行结果：加载摘要与帧循环实际绘制的帧数。
#[derive(Debug, Clone)]
pub struct CliOutcome {
    pub report: LoadReport,
    pub frames: u64,
}

pub fn headless_viewer(config: &AppConfig) -> Result<HeadlessViewer, FrontendError> {
    let options = viewport_options(config)?;
    let loader = DocumentLoader::new(&config.loader)?;
    let [width, height] = config.viewport.size;
    let viewer = Viewer::mount(
        MemoryScene::new(),
        PanZoomController::new(options.navigation),
        loader,
        DxfTextParser::new(),
        options,
        Some(ViewportSize::new(width, height)),
    )
    .on_success(|report| {
        info!(
            source = %report.source,
            primitives = report.primitives,
            skipped = report.skipped,
            "DXF 已渲染到无头场景"
        );
    })
    .on_failure(|err| {
        error!(error = %err, "DXF 加载失败");
    });
    Ok(viewer)
}

/// 加载文档、可选地运行若干帧，然后卸载视口。
pub async fn run(
    config: &AppConfig,
    source: SourceReference,
    frames: Option<u64>,
) -> Result<CliOutcome, FrontendError> {
    let mut viewer = headless_viewer(config)?;
    let report = match viewer.load(source).await {
        LoadStatus::Applied(report) => report,
        LoadStatus::Failed(err) => return Err(err.into()),
        LoadStatus::Superseded => return Err(FrontendError::LoadSuperseded),
    };

    let mut drawn = 0;
    if let Some(limit) = frames.filter(|limit| *limit > 0) {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let loop_config = FrameLoopConfig::new(config.frontend.frame_rate).with_max_frames(limit);
        drawn = run_frame_loop(viewer.session_mut(), loop_config, shutdown_rx).await;
    }
    viewer.teardown();

    Ok(CliOutcome {
        report,
        frames: drawn,
    })
}

/// 生成面向终端的加载摘要。
pub fn render_report(outcome: &CliOutcome) -> String {
    let report = &outcome.report;
    let mut out = String::new();
    let _ = writeln!(out, "DXF 查看器（无头模式）");
    let _ = writeln!(out, "文档来源：{}", report.source);
    let _ = writeln!(out, "实体数量：{}", report.entities);
    let _ = writeln!(out, "图元数量：{}", report.primitives);
    let _ = writeln!(out, "跳过实体：{}", report.skipped);
    let _ = writeln!(out, "未识别实体：{}", report.unrecognized);
    let _ = writeln!(out, "实体类型：");
    for (kind, count) in &report.kinds {
        let _ = writeln!(out, "  - {kind}: {count}");
    }
    if report.bounds.is_empty() {
        let _ = writeln!(out, "包围盒：空");
    } else {
        let _ = writeln!(
            out,
            "包围盒：min={} max={}",
            format_point(report.bounds.min()),
            format_point(report.bounds.max())
        );
    }
    let _ = writeln!(
        out,
        "相机：位置={} 目标={} near={:.2} far={:.2}",
        format_point(report.camera.position),
        format_point(report.camera.target),
        report.camera.near,
        report.camera.far
    );
    if outcome.frames > 0 {
        let _ = writeln!(out, "已绘制帧数：{}", outcome.frames);
    }
    out
}

fn format_point(point: Point3) -> String {
    format!("({:.2}, {:.2}, {:.2})", point.x(), point.y(), point.z())
}

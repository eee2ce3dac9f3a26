use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use dxfview_core::camera::{CameraPose, ViewportSize};
use dxfview_core::geometry::Bounds3D;
use dxfview_engine::navigation::NavigationController;
use dxfview_engine::scene::SceneGraph;
use dxfview_engine::session::{
    CommitOutcome, FrameRequest, LoadTicket, ViewportOptions, ViewportSession,
};
use dxfview_engine::translate::translate;
use dxfview_io::DocumentParser;

use crate::errors::ViewerError;
use crate::loader::{LoadError, LoadFuture, SourceLoader, SourceReference};

/// 成功提交一次加载后交给回调的摘要。
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub ticket: LoadTicket,
    pub source: String,
    pub entities: usize,
    pub primitives: usize,
    pub skipped: usize,
    pub unrecognized: usize,
    /// 按类型标记统计的实体数量。
    pub kinds: BTreeMap<String, usize>,
    pub bounds: Bounds3D,
    pub framed: bool,
    pub camera: CameraPose,
}

#[derive(Debug)]
pub enum LoadStatus {
    Applied(LoadReport),
    Failed(ViewerError),
    /// 已有更新的加载请求，结果被静默丢弃。
    Superseded,
}

/// 已发出但尚未完成的加载。`future` 不借用视口，可以交给任意执行器等待。
pub struct PendingLoad {
    pub ticket: LoadTicket,
    pub future: LoadFuture,
}

impl PendingLoad {
    pub async fn resolve(self) -> (LoadTicket, Result<String, LoadError>) {
        let result = self.future.await;
        (self.ticket, result)
    }
}

pub type SuccessCallback = Box<dyn FnMut(&LoadReport)>;
pub type FailureCallback = Box<dyn FnMut(&ViewerError)>;

/// 组合加载器、解析器与视口会话，负责加载请求的代际管理与回调通知。
pub struct Viewer<S, N, L, P>
where
    S: SceneGraph,
    N: NavigationController,
    L: SourceLoader,
    P: DocumentParser,
{
    session: ViewportSession<S, N>,
    loader: L,
    parser: P,
    on_success: Option<SuccessCallback>,
    on_failure: Option<FailureCallback>,
    latest_source: Option<(LoadTicket, String)>,
}

impl<S, N, L, P> Viewer<S, N, L, P>
where
    S: SceneGraph,
    N: NavigationController,
    L: SourceLoader,
    P: DocumentParser,
{
    pub fn mount(
        scene: S,
        navigation: N,
        loader: L,
        parser: P,
        options: ViewportOptions,
        size: Option<ViewportSize>,
    ) -> Self {
        Self {
            session: ViewportSession::mount(scene, navigation, options, size),
            loader,
            parser,
            on_success: None,
            on_failure: None,
            latest_source: None,
        }
    }

    pub fn on_success(mut self, callback: impl FnMut(&LoadReport) + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn on_failure(mut self, callback: impl FnMut(&ViewerError) + 'static) -> Self {
        self.on_failure = Some(Box::new(callback));
        self
    }

    /// 发起加载并立即返回。之前未完成的请求在完成时会被丢弃。
    pub fn request_load(&mut self, source: SourceReference) -> PendingLoad {
        let ticket = self.session.begin_load();
        let label = source.to_string();
        info!(ticket = ticket.generation(), source = %label, "请求加载文档");
        self.latest_source = Some((ticket, label));
        PendingLoad {
            ticket,
            future: self.loader.load(source),
        }
    }

    /// 处理一次加载的结果：过期结果直接丢弃，其余结果解析、转换并提交。
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<String, LoadError>,
    ) -> LoadStatus {
        if !self.session.is_current(ticket) {
            debug!(ticket = ticket.generation(), "忽略过期的加载结果");
            return LoadStatus::Superseded;
        }

        let text = match result {
            Ok(text) => text,
            Err(err) => return self.fail(ViewerError::Load(err)),
        };
        let document = match self.parser.parse(&text) {
            Ok(document) => document,
            Err(err) => return self.fail(ViewerError::Parse(err)),
        };

        let translation = translate(document.entities());
        let summary = match self.session.commit(ticket, &translation) {
            Ok(CommitOutcome::Applied(summary)) => summary,
            Ok(CommitOutcome::Superseded { .. }) => return LoadStatus::Superseded,
            Err(err) => return self.fail(ViewerError::Commit(err)),
        };

        let mut kinds = BTreeMap::new();
        for entity in document.entities() {
            *kinds.entry(entity.type_tag().to_string()).or_insert(0) += 1;
        }
        let source = self
            .latest_source
            .as_ref()
            .filter(|(latest, _)| *latest == ticket)
            .map(|(_, label)| label.clone())
            .unwrap_or_default();

        let report = LoadReport {
            ticket,
            source,
            entities: document.len(),
            primitives: summary.primitives,
            skipped: translation.skipped,
            unrecognized: translation.unrecognized,
            kinds,
            bounds: summary.bounds,
            framed: summary.framed,
            camera: summary.camera,
        };
        if let Some(callback) = self.on_success.as_mut() {
            callback(&report);
        }
        LoadStatus::Applied(report)
    }

    /// 发起加载并等待其完成。
    pub async fn load(&mut self, source: SourceReference) -> LoadStatus {
        let (ticket, result) = self.request_load(source).resolve().await;
        self.complete_load(ticket, result)
    }

    pub fn resize(&mut self, size: Option<ViewportSize>) -> bool {
        self.session.handle_resize(size)
    }

    pub fn tick(&mut self) -> FrameRequest {
        self.session.tick()
    }

    pub fn teardown(&mut self) {
        self.session.teardown();
    }

    pub fn session(&self) -> &ViewportSession<S, N> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ViewportSession<S, N> {
        &mut self.session
    }

    fn fail(&mut self, err: ViewerError) -> LoadStatus {
        warn!(error = %err, "文档加载失败，保留当前场景");
        if let Some(callback) = self.on_failure.as_mut() {
            callback(&err);
        }
        LoadStatus::Failed(err)
    }
}

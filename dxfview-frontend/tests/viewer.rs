use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;

use tokio::sync::oneshot;

use dxfview_config::LoaderConfig;
use dxfview_core::camera::ViewportSize;
use dxfview_engine::navigation::PanZoomController;
use dxfview_engine::scene::{MemoryScene, SceneGraph};
use dxfview_engine::session::ViewportOptions;
use dxfview_frontend::errors::ViewerError;
use dxfview_frontend::loader::{DocumentLoader, LoadError, LoadFuture, SourceLoader, SourceReference};
use dxfview_frontend::viewer::{LoadReport, LoadStatus, Viewer};
use dxfview_io::{DxfTextParser, ParseError};

type Reply = Result<String, LoadError>;

/// 按请求顺序交出预先准备的通道，由测试决定每个请求何时完成。
struct ScriptedLoader {
    replies: RefCell<VecDeque<oneshot::Receiver<Reply>>>,
}

impl ScriptedLoader {
    fn new(replies: Vec<oneshot::Receiver<Reply>>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
        }
    }
}

impl SourceLoader for ScriptedLoader {
    fn load(&self, _source: SourceReference) -> LoadFuture {
        let reply = self.replies.borrow_mut().pop_front();
        Box::pin(async move {
            match reply {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(LoadError::Runtime("reply dropped".to_string()))),
                None => Err(LoadError::Runtime("no scripted reply".to_string())),
            }
        })
    }
}

#[derive(Default)]
struct Calls {
    successes: Vec<LoadReport>,
    failures: Vec<String>,
}

fn mount<L: SourceLoader>(
    loader: L,
    calls: &Rc<RefCell<Calls>>,
) -> Viewer<MemoryScene, PanZoomController, L, DxfTextParser> {
    let on_success = Rc::clone(calls);
    let on_failure = Rc::clone(calls);
    Viewer::mount(
        MemoryScene::new(),
        PanZoomController::default(),
        loader,
        DxfTextParser::new(),
        ViewportOptions::default(),
        Some(ViewportSize::new(800.0, 600.0)),
    )
    .on_success(move |report| on_success.borrow_mut().successes.push(report.clone()))
    .on_failure(move |err| on_failure.borrow_mut().failures.push(err.to_string()))
}

fn entities_section(body: &str) -> String {
    format!("0\nSECTION\n2\nENTITIES\n{body}0\nENDSEC\n0\nEOF\n")
}

fn circles(count: usize) -> String {
    let body: String = (0..count)
        .map(|i| format!("0\nCIRCLE\n10\n{}\n20\n0\n40\n1\n", i * 10))
        .collect();
    entities_section(&body)
}

fn memory(name: &str) -> SourceReference {
    SourceReference::memory(name, Vec::new())
}

#[tokio::test]
async fn stale_result_is_discarded_when_newer_load_resolves_first() {
    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();
    let calls = Rc::new(RefCell::new(Calls::default()));
    let mut viewer = mount(ScriptedLoader::new(vec![first_rx, second_rx]), &calls);

    let first = viewer.request_load(memory("first.dxf"));
    let second = viewer.request_load(memory("second.dxf"));

    second_tx.send(Ok(circles(2))).unwrap();
    let (ticket, result) = second.resolve().await;
    assert!(matches!(viewer.complete_load(ticket, result), LoadStatus::Applied(_)));

    first_tx.send(Ok(circles(5))).unwrap();
    let (ticket, result) = first.resolve().await;
    assert!(matches!(
        viewer.complete_load(ticket, result),
        LoadStatus::Superseded
    ));

    assert_eq!(viewer.session().scene().primitive_count(), 2);
    let calls = calls.borrow();
    assert_eq!(calls.successes.len(), 1);
    assert!(calls.successes[0].source.starts_with("memory:second.dxf"));
    assert!(calls.failures.is_empty());
}

#[tokio::test]
async fn stale_result_is_discarded_when_it_resolves_first() {
    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();
    let calls = Rc::new(RefCell::new(Calls::default()));
    let mut viewer = mount(ScriptedLoader::new(vec![first_rx, second_rx]), &calls);

    let first = viewer.request_load(memory("first.dxf"));
    let second = viewer.request_load(memory("second.dxf"));

    first_tx.send(Ok(circles(5))).unwrap();
    let (ticket, result) = first.resolve().await;
    assert!(matches!(
        viewer.complete_load(ticket, result),
        LoadStatus::Superseded
    ));
    assert_eq!(viewer.session().scene().primitive_count(), 0);

    second_tx.send(Ok(circles(3))).unwrap();
    let (ticket, result) = second.resolve().await;
    match viewer.complete_load(ticket, result) {
        LoadStatus::Applied(report) => assert_eq!(report.primitives, 3),
        other => panic!("expected applied load, got {other:?}"),
    }
    assert_eq!(viewer.session().scene().primitive_count(), 3);
}

#[tokio::test]
async fn failures_notify_callback_and_keep_previous_scene() {
    let (ok_tx, ok_rx) = oneshot::channel();
    let (err_tx, err_rx) = oneshot::channel();
    let (bad_tx, bad_rx) = oneshot::channel();
    let calls = Rc::new(RefCell::new(Calls::default()));
    let mut viewer = mount(ScriptedLoader::new(vec![ok_rx, err_rx, bad_rx]), &calls);

    ok_tx.send(Ok(circles(4))).unwrap();
    assert!(matches!(
        viewer.load(memory("good.dxf")).await,
        LoadStatus::Applied(_)
    ));
    let camera = *viewer.session().camera();

    err_tx
        .send(Err(LoadError::Status {
            url: "https://example.com/missing.dxf".to_string(),
            status: 404,
        }))
        .unwrap();
    match viewer.load(memory("missing.dxf")).await {
        LoadStatus::Failed(ViewerError::Load(LoadError::Status { status, .. })) => {
            assert_eq!(status, 404)
        }
        other => panic!("expected load failure, got {other:?}"),
    }

    bad_tx
        .send(Ok("AutoCAD Binary DXF\r\n\u{1a}\0".to_string()))
        .unwrap();
    assert!(matches!(
        viewer.load(memory("binary.dxf")).await,
        LoadStatus::Failed(ViewerError::Parse(ParseError::Unsupported(_)))
    ));

    assert_eq!(viewer.session().scene().primitive_count(), 4);
    assert_eq!(*viewer.session().camera(), camera);
    let calls = calls.borrow();
    assert_eq!(calls.successes.len(), 1);
    assert_eq!(calls.failures.len(), 2);
}

#[tokio::test]
async fn document_without_drawable_entities_keeps_camera() {
    let (tx, rx) = oneshot::channel();
    let calls = Rc::new(RefCell::new(Calls::default()));
    let mut viewer = mount(ScriptedLoader::new(vec![rx]), &calls);
    let camera = *viewer.session().camera();

    tx.send(Ok(entities_section("0\nTEXT\n1\nhello\n"))).unwrap();
    match viewer.load(memory("text-only.dxf")).await {
        LoadStatus::Applied(report) => {
            assert_eq!(report.primitives, 0);
            assert_eq!(report.unrecognized, 1);
            assert!(!report.framed);
            assert!(report.bounds.is_empty());
        }
        other => panic!("expected applied load, got {other:?}"),
    }
    assert_eq!(*viewer.session().camera(), camera);
    assert_eq!(viewer.session().scene().primitive_count(), 0);
}

#[tokio::test]
async fn empty_document_is_rejected_by_parser() {
    let loader = DocumentLoader::new(&LoaderConfig::default()).expect("build loader");
    let calls = Rc::new(RefCell::new(Calls::default()));
    let mut viewer = mount(loader, &calls);

    assert!(matches!(
        viewer.load(SourceReference::memory("empty.dxf", Vec::new())).await,
        LoadStatus::Failed(ViewerError::Parse(ParseError::Empty))
    ));
    assert_eq!(calls.borrow().failures.len(), 1);
    assert_eq!(viewer.session().scene().primitive_count(), 0);
}

#[tokio::test]
async fn loads_fixture_from_disk_end_to_end() {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("../dxfview-io/tests/data/mixed_entities.dxf");
    let loader = DocumentLoader::new(&LoaderConfig::default()).expect("build loader");
    let calls = Rc::new(RefCell::new(Calls::default()));
    let mut viewer = mount(loader, &calls);

    let report = match viewer.load(SourceReference::Path(path)).await {
        LoadStatus::Applied(report) => report,
        other => panic!("expected applied load, got {other:?}"),
    };
    assert_eq!(report.entities, 9);
    assert_eq!(report.primitives, 8);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.unrecognized, 1);
    assert_eq!(report.kinds.get("TEXT"), Some(&1));
    assert!(report.framed);
    assert_eq!(report.camera.target, report.bounds.center());

    viewer.teardown();
    assert_eq!(viewer.session().scene().primitive_count(), 0);
    assert!(viewer.session().scene().is_released());
}

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

use dxfview_engine::navigation::NavigationController;
use dxfview_engine::scene::SceneGraph;
use dxfview_engine::session::{FrameRequest, ViewportSession};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLoopConfig {
    pub frame_rate: u32,
    /// 达到帧数后退出，`None` 表示一直运行到会话卸载或收到停止信号。
    pub max_frames: Option<u64>,
}

impl FrameLoopConfig {
    pub fn new(frame_rate: u32) -> Self {
        Self {
            frame_rate,
            max_frames: None,
        }
    }

    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate.max(1)))
    }
}

impl Default for FrameLoopConfig {
    fn default() -> Self {
        Self::new(60)
    }
}

/// 协作式帧循环：按固定间隔推进会话，返回实际绘制的帧数。
///
/// 停止信号为 `true`、发送端被丢弃、会话返回 `Stop` 或达到帧数上限时退出。
pub async fn run_frame_loop<S, N>(
    session: &mut ViewportSession<S, N>,
    config: FrameLoopConfig,
    mut shutdown: watch::Receiver<bool>,
) -> u64
where
    S: SceneGraph,
    N: NavigationController,
{
    let mut ticker = interval(config.period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut frames = 0u64;

    loop {
        if *shutdown.borrow() {
            break;
        }
        if config.max_frames.is_some_and(|max| frames >= max) {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {
                match session.tick() {
                    FrameRequest::Continue => frames += 1,
                    FrameRequest::Stop => break,
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    debug!(frames, "帧循环结束");
    frames
}

#[cfg(test)]
mod tests {
    use dxfview_core::camera::ViewportSize;
    use dxfview_engine::navigation::PanZoomController;
    use dxfview_engine::scene::MemoryScene;
    use dxfview_engine::session::ViewportOptions;

    use super::*;

    fn session() -> ViewportSession<MemoryScene, PanZoomController> {
        ViewportSession::mount(
            MemoryScene::new(),
            PanZoomController::default(),
            ViewportOptions::default(),
            Some(ViewportSize::new(640.0, 480.0)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_frame_limit() {
        let mut session = session();
        let (_tx, rx) = watch::channel(false);
        let frames = run_frame_loop(&mut session, FrameLoopConfig::new(30).with_max_frames(5), rx).await;
        assert_eq!(frames, 5);
        // 挂载时的一次重绘加上循环中的 5 帧
        assert_eq!(session.scene().frames_drawn(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn torn_down_session_stops_loop() {
        let mut session = session();
        session.teardown();
        let (_tx, rx) = watch::channel(false);
        let frames = run_frame_loop(&mut session, FrameLoopConfig::default(), rx).await;
        assert_eq!(frames, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_signal_stops_loop() {
        let mut session = session();
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let frames = run_frame_loop(&mut session, FrameLoopConfig::default(), rx).await;
        assert_eq!(frames, 0);

        let (tx, rx) = watch::channel(false);
        drop(tx);
        let frames = run_frame_loop(&mut session, FrameLoopConfig::default().with_max_frames(1000), rx).await;
        assert!(frames < 1000);
    }
}

use thiserror::Error;

use dxfview_core::color::ColorParseError;
use dxfview_engine::errors::EngineError;
use dxfview_io::ParseError;

use crate::loader::LoadError;

/// 一次加载失败的原因，会传给失败回调。
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("加载文档失败: {0}")]
    Load(#[from] LoadError),
    #[error("解析文档失败: {0}")]
    Parse(#[from] ParseError),
    #[error("提交场景失败: {0}")]
    Commit(#[from] EngineError),
}

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("Bevy 前端未启用，请使用 `--features bevy_app` 编译")]
    BevyFeatureDisabled,
    #[error("配置项 {field} 不是合法颜色: {source}")]
    InvalidColor {
        field: &'static str,
        #[source]
        source: ColorParseError,
    },
    #[error("未指定 DXF 来源")]
    MissingSource,
    #[error("加载请求已被更新的请求取代")]
    LoadSuperseded,
    #[error(transparent)]
    Viewer(#[from] ViewerError),
    #[error("启动异步运行时失败: {0}")]
    Runtime(#[from] std::io::Error),
}

impl From<LoadError> for FrontendError {
    fn from(err: LoadError) -> Self {
        FrontendError::Viewer(ViewerError::Load(err))
    }
}

pub mod framing;
pub mod navigation;
pub mod sampling;
pub mod scene;
pub mod session;
pub mod translate;

pub mod errors {
    use dxfview_core::entity::EntityKind;
    use thiserror::Error;

    use crate::scene::SceneError;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("视口会话已卸载")]
        SessionTornDown,
        #[error("场景图拒绝提交：{0}")]
        Scene(#[from] SceneError),
    }

    /// 单个实体无法转换的原因。只用于诊断日志，不会向调用方传播。
    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum EntityError {
        #[error("{kind} 缺少字段 {field}")]
        MissingField {
            kind: EntityKind,
            field: &'static str,
        },
        #[error("{kind} 字段 {field} 取值无效：{value}")]
        InvalidValue {
            kind: EntityKind,
            field: &'static str,
            value: f64,
        },
        #[error("{kind} 至少需要 {required} 个有效点，实际 {actual} 个")]
        TooFewPoints {
            kind: EntityKind,
            required: usize,
            actual: usize,
        },
    }
}

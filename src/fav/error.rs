//! 收藏服务 API 错误分类
//!
//! 调用方依赖这里的分类决定提示文案与回滚策略

use thiserror::Error;

/// 收藏服务 API 错误
#[derive(Error, Debug)]
pub enum ApiError {
    /// 网络层失败（连接拒绝、超时等）
    #[error("网络请求失败: {0}")]
    Transport(#[from] reqwest::Error),

    /// 服务端返回非 2xx（已提取 body 中的 error 字段）
    #[error("服务端错误 {status}: {message}")]
    Http { status: u16, message: String },

    /// 同一聊天内同一消息重复收藏（HTTP 409）
    #[error("{0}")]
    Conflict(String),

    /// 目标收藏不存在（仅在不容忍 404 的操作中出现）
    #[error("{0}")]
    NotFound(String),

    /// 响应 body 解析失败
    #[error("响应解析失败: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// 是否为重复收藏冲突
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict(_))
    }
}

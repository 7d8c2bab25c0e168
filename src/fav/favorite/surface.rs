//! 聊天视图表面接口
//!
//! 消息列表上收藏图标的插入与状态涂刷都通过这个 seam 进行，
//! 本 crate 不关心宿主用什么方式渲染

use async_trait::async_trait;

/// 视图中一条可见消息的快照
#[derive(Debug, Clone)]
pub struct SurfaceMessage {
    /// 消息 ID（宿主的 mesid）
    pub message_id: String,
    /// 是否已经插入过收藏图标
    pub has_toggle: bool,
    /// 图标当前显示的收藏状态
    pub favorited: bool,
}

/// 宿主聊天视图表面
#[async_trait]
pub trait ChatSurface: Send + Sync {
    /// 当前视图中可见的消息快照列表
    async fn visible_messages(&self) -> Vec<SurfaceMessage>;

    /// 给指定消息插入收藏图标（调用方保证不重复插入）
    async fn insert_toggle(&self, message_id: &str);

    /// 设置指定消息图标的收藏状态
    async fn set_toggle_state(&self, message_id: &str, favorited: bool);

    /// 滚动到指定消息，消息不在已加载的记录中时返回 false
    async fn scroll_to_message(&self, message_id: &str) -> bool;
}

/// 默认空实现：没有可见消息，滚动永远失败
pub struct EmptyChatSurface;

#[async_trait]
impl ChatSurface for EmptyChatSurface {
    async fn visible_messages(&self) -> Vec<SurfaceMessage> {
        Vec::new()
    }

    async fn insert_toggle(&self, _message_id: &str) {
        // 默认不做任何处理
    }

    async fn set_toggle_state(&self, _message_id: &str, _favorited: bool) {
        // 默认不做任何处理
    }

    async fn scroll_to_message(&self, _message_id: &str) -> bool {
        false
    }
}

//! 收藏模块共享类型
//!
//! 过滤器、宿主事件与通知级别定义

/// 收藏列表过滤器
///
/// 与后端查询参数的对应关系由 `FavoritesSyncer::resolve_filter` 决定：
/// - `Chat`：按来源聊天 ID 过滤
/// - `Context`：按当前角色（优先）或群组过滤；两者都没有时退化为 `All`
/// - `All`：不加任何过滤条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoriteFilter {
    /// 指定聊天内的收藏
    Chat(String),
    /// 当前角色/群组的全部收藏
    Context,
    /// 所有收藏
    All,
}

impl FavoriteFilter {
    /// 状态栏展示用的过滤器描述
    pub fn describe(&self) -> String {
        match self {
            FavoriteFilter::Chat(chat_id) => {
                let short: String = chat_id.chars().take(8).collect();
                if short.is_empty() {
                    "当前聊天 (未知)".to_string()
                } else {
                    format!("当前聊天 ({}...)", short)
                }
            }
            FavoriteFilter::Context => "当前角色/群组".to_string(),
            FavoriteFilter::All => "所有收藏".to_string(),
        }
    }
}

/// 宿主应用生命周期事件
///
/// 由宿主事件总线投递给 `FavoritesClient::handle_host_event`
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// 切换了活动聊天（`None` 表示当前没有打开的聊天）
    ChatChanged { chat_id: Option<String> },
    /// 消息被删除（DOM 节点已移除，只需清理后端收藏）
    MessageDeleted { message_id: String },
    /// 收到新消息
    MessageReceived { message_id: String },
    /// 发送了新消息
    MessageSent { message_id: String },
    /// 消息被编辑
    MessageUpdated { message_id: String },
    /// 消息被重新生成（swipe），内容可能已变化
    MessageSwiped { message_id: String },
    /// 加载了更早的历史消息
    MoreMessagesLoaded,
    /// 宿主视图层完成了一次整体渲染
    TranscriptRendered,
}

/// 用户可见通知的级别（对应宿主的 toast 提示）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

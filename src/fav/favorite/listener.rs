//! 收藏监听器回调接口

use crate::fav::types::NoticeLevel;
use async_trait::async_trait;

/// 收藏监听器回调接口（宿主用它接收 toast 提示与操作结果）
#[async_trait]
pub trait FavoritesListener: Send + Sync {
    /// 用户可见的瞬时通知（对应宿主的 toast）
    async fn on_notice(&self, level: NoticeLevel, message: String);

    /// 乐观切换落定：`favorited` 为落定后的状态，`confirmed` 表示
    /// 服务端确认成功（false 表示已回滚到点击前的状态）
    async fn on_toggle_settled(&self, message_id: String, favorited: bool, confirmed: bool);

    /// 跳转到来源消息的结果：`located` 表示消息在已加载的记录中被定位到
    async fn on_jump_to_message(&self, chat_id: String, message_id: String, located: bool);
}

/// 默认空实现（无操作）
pub struct EmptyFavoritesListener;

#[async_trait]
impl FavoritesListener for EmptyFavoritesListener {
    async fn on_notice(&self, _level: NoticeLevel, _message: String) {
        // 默认不做任何处理
    }

    async fn on_toggle_settled(&self, _message_id: String, _favorited: bool, _confirmed: bool) {
        // 默认不做任何处理
    }

    async fn on_jump_to_message(&self, _chat_id: String, _message_id: String, _located: bool) {
        // 默认不做任何处理
    }
}

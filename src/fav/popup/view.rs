//! 收藏夹弹窗视图接口
//!
//! 控制器只产出渲染模型，具体怎么画交给宿主实现

use crate::fav::types::FavoriteFilter;
use async_trait::async_trait;

/// 侧边栏条目
#[derive(Debug, Clone)]
pub struct SidebarEntry {
    /// 展示文案
    pub label: String,
    /// 点选后应用的过滤器
    pub filter: FavoriteFilter,
    /// 是否为当前选中项
    pub selected: bool,
}

/// 列表中一张收藏卡片的渲染模型
#[derive(Debug, Clone)]
pub struct FavoriteCard {
    pub favorite_id: String,
    /// 来源聊天 ID（跳转用）
    pub chat_id: String,
    /// 来源消息 ID（跳转用）
    pub message_id: String,
    /// 缩短后的来源聊天显示名
    pub chat_label: String,
    pub sender: String,
    /// 收藏时间，`YYYY-MM-DD HH:mm`
    pub added_time: String,
    /// 备注内容（可能为空串）
    pub note: String,
    /// 备注区是否可见（备注非空时为 true）
    pub note_visible: bool,
    /// 经宿主格式化的预览文本
    pub preview: String,
}

/// 列表区整体渲染模型
#[derive(Debug, Clone)]
pub struct ListRender {
    /// 状态栏文案，如 `显示: 所有收藏 - 25 条`
    pub status: String,
    /// 当前页的卡片（空列表时为空，由视图展示空态提示）
    pub cards: Vec<FavoriteCard>,
    /// 过滤后的总条数
    pub total: usize,
    /// 当前页（1 起）
    pub page: usize,
    /// 总页数（至少为 1）
    pub total_pages: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

/// 收藏夹弹窗视图
#[async_trait]
pub trait PopupView: Send + Sync {
    /// 打开弹窗外壳
    async fn show(&self);

    /// 渲染侧边栏（每次过滤器切换都会整体重绘选中态）
    async fn render_sidebar(&self, entries: Vec<SidebarEntry>);

    /// 渲染列表区和分页
    async fn render_list(&self, render: ListRender);

    /// 就地更新一张卡片的备注文本与可见性（不整页重载）
    async fn patch_note(&self, favorite_id: &str, note: &str, visible: bool);

    /// 关闭弹窗
    async fn close(&self);
}

/// 默认空实现（无操作）
pub struct EmptyPopupView;

#[async_trait]
impl PopupView for EmptyPopupView {
    async fn show(&self) {}

    async fn render_sidebar(&self, _entries: Vec<SidebarEntry>) {}

    async fn render_list(&self, _render: ListRender) {}

    async fn patch_note(&self, _favorite_id: &str, _note: &str, _visible: bool) {}

    async fn close(&self) {}
}

//! 收藏夹弹窗控制器
//!
//! 维护一次弹窗会话的显式视图状态（过滤器 + 页码 + 相关聊天缓存），
//! 每次过滤/翻页都重新全量拉取再在本地切片，不复用上一次的渲染结果

use crate::fav::favorite::listener::FavoritesListener;
use crate::fav::favorite::models::{FavoriteItem, FavoriteRole, RelatedChat};
use crate::fav::favorite::service::FavoritesSyncer;
use crate::fav::host::{DialogHost, HostContext};
use crate::fav::popup::view::{FavoriteCard, ListRender, PopupView, SidebarEntry};
use crate::fav::types::{FavoriteFilter, NoticeLevel};
use chrono::Local;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// 一次弹窗会话的视图状态
///
/// 相关聊天列表只在打开时拉取一次，整个会话期间复用
pub struct PopupState {
    pub filter: FavoriteFilter,
    /// 当前页，1 起
    pub page: usize,
    related_chats: Vec<RelatedChat>,
}

/// 总页数：至少为 1
pub(crate) fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 || total == 0 {
        return 1;
    }
    (total + page_size - 1) / page_size
}

/// 把页码收敛到 `[1, total_pages]`
pub(crate) fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// 当前页在完整列表中的切片范围 `[start, end)`
pub(crate) fn page_bounds(page: usize, total: usize, page_size: usize) -> (usize, usize) {
    let start = (page - 1) * page_size;
    let end = (start + page_size).min(total);
    (start.min(total), end)
}

/// 缩短过长的显示名：超过 `max` 个字符时取前 `max - 2` 个并追加 `...`
pub(crate) fn shorten_name(name: &str, max: usize) -> String {
    if name.chars().count() > max {
        let head: String = name.chars().take(max.saturating_sub(2)).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

/// 收藏时间的展示格式（本地时区，`YYYY-MM-DD HH:mm`）
pub(crate) fn format_added_time(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// 收藏夹弹窗控制器
pub struct PopupController {
    syncer: Arc<FavoritesSyncer>,
    host: Arc<dyn HostContext>,
    view: Arc<dyn PopupView>,
    dialogs: Arc<dyn DialogHost>,
    listener: Arc<dyn FavoritesListener>,
    /// 每页条数
    page_size: usize,
    /// None 表示弹窗关闭
    session: Mutex<Option<PopupState>>,
}

impl PopupController {
    /// 创建新的弹窗控制器
    pub fn new(
        syncer: Arc<FavoritesSyncer>,
        host: Arc<dyn HostContext>,
        view: Arc<dyn PopupView>,
        dialogs: Arc<dyn DialogHost>,
        listener: Arc<dyn FavoritesListener>,
        page_size: usize,
    ) -> Self {
        Self {
            syncer,
            host,
            view,
            dialogs,
            listener,
            page_size,
            session: Mutex::new(None),
        }
    }

    /// 弹窗是否打开
    pub async fn is_open(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// 当前会话的 (过滤器, 页码)，关闭时为 None
    pub async fn current_state(&self) -> Option<(FavoriteFilter, usize)> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|s| (s.filter.clone(), s.page))
    }

    /// 打开弹窗
    ///
    /// 过滤器重置为“当前聊天”（没有活动聊天时退化为全部并给出警告），
    /// 页码重置为 1，然后加载侧边栏和第一页
    pub async fn open(&self) -> anyhow::Result<()> {
        let chat_id = self.host.chat_id().await;
        let filter = match &chat_id {
            Some(id) => FavoriteFilter::Chat(id.clone()),
            None => {
                self.listener
                    .on_notice(
                        NoticeLevel::Warning,
                        "没有打开的聊天，显示所有收藏".to_string(),
                    )
                    .await;
                FavoriteFilter::All
            }
        };
        info!("[Popup] 打开收藏夹，初始过滤器: {:?}", filter);

        self.view.show().await;
        let related_chats = self.syncer.fetch_related_chats().await;

        let mut session = self.session.lock().await;
        *session = Some(PopupState {
            filter,
            page: 1,
            related_chats,
        });
        let state = session.as_mut().ok_or_else(|| anyhow::anyhow!("弹窗状态丢失"))?;
        self.render_sidebar(state).await;
        self.refresh_with(state).await;
        Ok(())
    }

    /// 关闭弹窗（未打开时为空操作）
    pub async fn close(&self) {
        let mut session = self.session.lock().await;
        if session.take().is_some() {
            info!("[Popup] 关闭收藏夹");
            self.view.close().await;
        }
    }

    /// 切换过滤器并回到第一页
    pub async fn select_filter(&self, filter: FavoriteFilter) {
        let mut session = self.session.lock().await;
        let Some(state) = session.as_mut() else {
            return;
        };
        info!("[Popup] 切换过滤器: {:?}", filter);
        state.filter = filter;
        state.page = 1;
        self.render_sidebar(state).await;
        self.refresh_with(state).await;
    }

    /// 上一页
    pub async fn prev_page(&self) {
        let mut session = self.session.lock().await;
        let Some(state) = session.as_mut() else {
            return;
        };
        if state.page > 1 {
            state.page -= 1;
            self.refresh_with(state).await;
        }
    }

    /// 下一页（越界由拉取后的收敛处理）
    pub async fn next_page(&self) {
        let mut session = self.session.lock().await;
        let Some(state) = session.as_mut() else {
            return;
        };
        state.page += 1;
        self.refresh_with(state).await;
    }

    /// 直接跳页（0 或越界的页码会被收敛）
    pub async fn set_page(&self, page: usize) {
        let mut session = self.session.lock().await;
        let Some(state) = session.as_mut() else {
            return;
        };
        state.page = page.max(1);
        self.refresh_with(state).await;
    }

    /// 重新拉取并渲染当前页
    pub async fn refresh_content(&self) {
        let mut session = self.session.lock().await;
        if let Some(state) = session.as_mut() {
            self.refresh_with(state).await;
        }
    }

    /// 收藏在别处发生增删后，若弹窗正显示该聊天的收藏则刷新内容
    pub async fn handle_external_change(&self, chat_id: &str) {
        let mut session = self.session.lock().await;
        let Some(state) = session.as_mut() else {
            return;
        };
        if state.filter == FavoriteFilter::Chat(chat_id.to_string()) {
            debug!("[Popup] 聊天 {} 的收藏在别处变化，刷新列表", chat_id);
            self.refresh_with(state).await;
        }
    }

    /// 编辑备注：输入框以当前备注为初值，取消则不做任何事；
    /// 成功后只就地更新这一张卡片，不整页重载
    pub async fn edit_note(&self, favorite_id: &str, current_note: &str) {
        let Some(note) = self
            .dialogs
            .input("为这条收藏添加/编辑备注:", current_note)
            .await
        else {
            debug!("[Popup] 用户取消了备注编辑");
            return;
        };
        if let Ok(updated) = self.syncer.update_note(favorite_id, &note).await {
            let visible = !note.trim().is_empty();
            self.view.patch_note(&updated.id, &note, visible).await;
        }
    }

    /// 删除收藏：确认后删除，成功则重载当前页并让图标与服务端对齐
    pub async fn delete_favorite(&self, favorite_id: &str) {
        if !self.dialogs.confirm("确定要删除这条收藏吗？").await {
            debug!("[Popup] 用户取消了删除");
            return;
        }
        if self.syncer.remove_by_id(favorite_id).await {
            self.listener
                .on_notice(NoticeLevel::Success, "收藏已删除".to_string())
                .await;
            self.refresh_content().await;
            self.syncer.refresh_icons().await;
        }
    }

    /// 组装侧边栏条目：固定项 + 相关聊天（排除当前聊天）
    async fn render_sidebar(&self, state: &PopupState) {
        let chat_id = self.host.chat_id().await;
        let has_character = self.host.character_id().await.is_some();

        let mut entries = Vec::new();
        if let Some(chat_id) = &chat_id {
            entries.push(SidebarEntry {
                label: "当前聊天".to_string(),
                filter: FavoriteFilter::Chat(chat_id.clone()),
                selected: state.filter == FavoriteFilter::Chat(chat_id.clone()),
            });
        }
        entries.push(SidebarEntry {
            label: if has_character {
                "当前角色全部".to_string()
            } else {
                "当前群组全部".to_string()
            },
            filter: FavoriteFilter::Context,
            selected: state.filter == FavoriteFilter::Context,
        });
        entries.push(SidebarEntry {
            label: "所有收藏".to_string(),
            filter: FavoriteFilter::All,
            selected: state.filter == FavoriteFilter::All,
        });

        for chat in &state.related_chats {
            if chat_id.as_deref() == Some(chat.chat_id.as_str()) {
                continue;
            }
            let display = if chat.chat_name.is_empty() {
                chat.chat_id.as_str()
            } else {
                chat.chat_name.as_str()
            };
            entries.push(SidebarEntry {
                label: shorten_name(display, 25),
                filter: FavoriteFilter::Chat(chat.chat_id.clone()),
                selected: state.filter == FavoriteFilter::Chat(chat.chat_id.clone()),
            });
        }

        self.view.render_sidebar(entries).await;
    }

    /// 全量拉取 + 页码收敛 + 本地切片 + 渲染
    async fn refresh_with(&self, state: &mut PopupState) {
        let favorites = self.syncer.fetch_favorites(&state.filter).await;
        let total = favorites.len();
        let pages = total_pages(total, self.page_size);
        state.page = clamp_page(state.page, pages);
        let (start, end) = page_bounds(state.page, total, self.page_size);

        let mut cards = Vec::with_capacity(end - start);
        for item in &favorites[start..end] {
            cards.push(self.build_card(item).await);
        }

        let render = ListRender {
            status: format!("显示: {} - {} 条", state.filter.describe(), total),
            cards,
            total,
            page: state.page,
            total_pages: pages,
            has_prev: state.page > 1,
            has_next: state.page < pages,
        };
        debug!(
            "[Popup] 渲染列表，总数: {}, 页: {}/{}",
            total, render.page, render.total_pages
        );
        self.view.render_list(render).await;
    }

    /// 把一条收藏转成渲染卡片
    async fn build_card(&self, item: &FavoriteItem) -> FavoriteCard {
        let chat_display = item
            .original_chat_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| item.original_chat_id.clone());
        let note = item.note.clone().unwrap_or_default();
        let preview = self
            .host
            .format_preview(
                &item.message_preview,
                &item.sender,
                item.role == FavoriteRole::User,
            )
            .await;

        FavoriteCard {
            favorite_id: item.id.clone(),
            chat_id: item.original_chat_id.clone(),
            message_id: item.original_message_id.clone(),
            chat_label: shorten_name(&chat_display, 30),
            sender: item.sender.clone(),
            added_time: format_added_time(item.added_timestamp),
            note_visible: !note.trim().is_empty(),
            note,
            preview,
        }
    }
}

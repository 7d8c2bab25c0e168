//! 收藏同步服务层
//!
//! 负责收藏图标与服务端状态的对齐：图标插入幂等，刷新永远是
//! 全量拉取 + 全量涂刷，乐观切换是系统里唯一的两阶段补偿操作

use crate::fav::error::ApiError;
use crate::fav::favorite::api::FavoritesApi;
use crate::fav::favorite::listener::FavoritesListener;
use crate::fav::favorite::models::{
    chat_display_name, message_preview, CreateFavoritePayload, FavoriteItem, FavoriteRole,
    RelatedChat,
};
use crate::fav::favorite::surface::ChatSurface;
use crate::fav::host::HostContext;
use crate::fav::types::{FavoriteFilter, NoticeLevel};
use anyhow::{anyhow, Result};
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 收藏同步器
pub struct FavoritesSyncer {
    /// 收藏 API 客户端
    api: FavoritesApi,
    /// 宿主上下文
    host: Arc<dyn HostContext>,
    /// 聊天视图表面
    surface: Arc<dyn ChatSurface>,
    /// 收藏监听器
    listener: Arc<dyn FavoritesListener>,
    /// 预览截取的最大字符数
    preview_limit: usize,
}

impl FavoritesSyncer {
    /// 创建新的收藏同步器
    pub fn new(
        api: FavoritesApi,
        host: Arc<dyn HostContext>,
        surface: Arc<dyn ChatSurface>,
        listener: Arc<dyn FavoritesListener>,
        preview_limit: usize,
    ) -> Self {
        Self {
            api,
            host,
            surface,
            listener,
            preview_limit,
        }
    }

    async fn notice(&self, level: NoticeLevel, message: impl Into<String>) {
        self.listener.on_notice(level, message.into()).await;
    }

    /// 把过滤器解析成后端查询参数 (chatId, characterId, groupId)
    ///
    /// `Context` 下角色优先于群组；两者都没有时不加参数，等价于全部
    async fn resolve_filter(
        &self,
        filter: &FavoriteFilter,
    ) -> (Option<String>, Option<String>, Option<String>) {
        match filter {
            FavoriteFilter::Chat(chat_id) => (Some(chat_id.clone()), None, None),
            FavoriteFilter::Context => {
                if let Some(character_id) = self.host.character_id().await {
                    (None, Some(character_id), None)
                } else if let Some(group_id) = self.host.group_id().await {
                    (None, None, Some(group_id))
                } else {
                    warn!("[FavSync] 没有角色/群组上下文，Context 过滤退化为全部");
                    (None, None, None)
                }
            }
            FavoriteFilter::All => (None, None, None),
        }
    }

    /// 按过滤器拉取收藏列表
    ///
    /// 任何失败都转成一条警告通知并返回空列表，调用方不区分
    /// “没有收藏”和“拉取失败”
    pub async fn fetch_favorites(&self, filter: &FavoriteFilter) -> Vec<FavoriteItem> {
        let (chat_id, character_id, group_id) = self.resolve_filter(filter).await;
        match self
            .api
            .list_favorites(chat_id.as_deref(), character_id.as_deref(), group_id.as_deref())
            .await
        {
            Ok(items) => {
                debug!(
                    "[FavSync] 过滤器 {:?} 拉取到 {} 条收藏",
                    filter,
                    items.len()
                );
                items
            }
            Err(e) => {
                self.notice(NoticeLevel::Warning, format!("加载收藏列表失败: {}", e))
                    .await;
                Vec::new()
            }
        }
    }

    /// 拉取当前角色/群组的相关聊天列表
    ///
    /// 没有角色/群组上下文时不发请求，直接返回空
    pub async fn fetch_related_chats(&self) -> Vec<RelatedChat> {
        let character_id = self.host.character_id().await;
        let group_id = if character_id.is_some() {
            None
        } else {
            self.host.group_id().await
        };
        if character_id.is_none() && group_id.is_none() {
            warn!("[FavSync] 没有角色/群组上下文，无法获取相关聊天");
            return Vec::new();
        }

        match self
            .api
            .list_related_chats(character_id.as_deref(), group_id.as_deref())
            .await
        {
            Ok(chats) => chats,
            Err(e) => {
                self.notice(
                    NoticeLevel::Warning,
                    format!("加载相关聊天列表失败: {}", e),
                )
                .await;
                Vec::new()
            }
        }
    }

    /// 给所有还没有收藏图标的可见消息插入图标（幂等）
    pub async fn ensure_toggle_controls(&self) {
        let messages = self.surface.visible_messages().await;
        let mut inserted = 0;
        for message in messages.iter().filter(|m| !m.has_toggle) {
            self.surface.insert_toggle(&message.message_id).await;
            inserted += 1;
        }
        if inserted > 0 {
            debug!("[FavSync] 插入了 {} 个收藏图标", inserted);
        }
    }

    /// 刷新当前视图中所有收藏图标的状态
    ///
    /// 只对当前活动聊天生效：全量拉取该聊天的收藏，建立
    /// 消息 ID -> 收藏 ID 映射后整体涂刷，没有增量路径
    pub async fn refresh_icons(&self) {
        self.ensure_toggle_controls().await;

        let Some(chat_id) = self.host.chat_id().await else {
            debug!("[FavSync] 没有当前聊天，所有图标设为未收藏");
            self.repaint_all(&HashMap::new()).await;
            return;
        };

        let favorites = self
            .fetch_favorites(&FavoriteFilter::Chat(chat_id.clone()))
            .await;
        let favorite_map: HashMap<String, String> = favorites
            .into_iter()
            .map(|f| (f.original_message_id, f.id))
            .collect();
        info!(
            "[FavSync] 当前聊天 ({}) 共 {} 条收藏，开始涂刷图标",
            chat_id,
            favorite_map.len()
        );
        self.repaint_all(&favorite_map).await;
    }

    /// 按映射整体涂刷可见图标（映射为空则全部置为未收藏）
    async fn repaint_all(&self, favorite_map: &HashMap<String, String>) {
        let messages = self.surface.visible_messages().await;
        let repaints = messages.iter().map(|message| {
            let favorited = favorite_map.contains_key(&message.message_id);
            self.surface.set_toggle_state(&message.message_id, favorited)
        });
        join_all(repaints).await;
        debug!("[FavSync] 图标刷新完成，共 {} 条消息", messages.len());
    }

    /// 切换一条消息的收藏状态（两阶段乐观操作）
    ///
    /// 阶段一立即翻转图标；阶段二等待网络落定，成功则保留并全量刷新，
    /// 失败（含重复收藏冲突）则回滚到点击前的状态。返回落定后的收藏状态
    pub async fn toggle_favorite(&self, message_id: &str) -> Result<bool> {
        let Some(chat_id) = self.host.chat_id().await else {
            self.notice(NoticeLevel::Error, "无法确定当前聊天，无法收藏")
                .await;
            return Err(anyhow!("没有活动聊天"));
        };

        let messages = self.surface.visible_messages().await;
        let Some(message) = messages.iter().find(|m| m.message_id == message_id) else {
            return Err(anyhow!("消息 {} 不在当前视图中", message_id));
        };
        let was_favorited = message.favorited;

        if was_favorited {
            // 取消收藏：先翻转再删除
            self.surface.set_toggle_state(message_id, false).await;
            match self.api.delete_by_message(&chat_id, message_id).await {
                Ok(removed) => {
                    if removed {
                        self.notice(NoticeLevel::Success, "收藏已取消").await;
                    }
                    self.listener
                        .on_toggle_settled(message_id.to_string(), false, true)
                        .await;
                    self.refresh_icons().await;
                    Ok(false)
                }
                Err(e) => {
                    self.surface.set_toggle_state(message_id, true).await;
                    self.notice(NoticeLevel::Error, format!("取消收藏失败: {}", e))
                        .await;
                    self.listener
                        .on_toggle_settled(message_id.to_string(), true, false)
                        .await;
                    Err(e.into())
                }
            }
        } else {
            // 新建收藏：先取消息内容，再翻转并提交
            let Some(transcript) = self.host.transcript_message(message_id).await else {
                self.notice(NoticeLevel::Error, "无法获取消息内容，收藏失败")
                    .await;
                return Err(anyhow!("聊天记录中没有消息 {}", message_id));
            };
            let payload = self.build_payload(&chat_id, &transcript).await;

            self.surface.set_toggle_state(message_id, true).await;
            match self.api.create_favorite(&payload).await {
                Ok(item) => {
                    info!("[FavSync] 收藏成功，ID: {}", item.id);
                    self.notice(NoticeLevel::Success, "消息已收藏").await;
                    self.listener
                        .on_toggle_settled(message_id.to_string(), true, true)
                        .await;
                    self.refresh_icons().await;
                    Ok(true)
                }
                Err(e) => {
                    self.surface.set_toggle_state(message_id, false).await;
                    let level = if e.is_conflict() {
                        NoticeLevel::Warning
                    } else {
                        NoticeLevel::Error
                    };
                    let message = if e.is_conflict() {
                        e.to_string()
                    } else {
                        format!("收藏失败: {}", e)
                    };
                    self.notice(level, message).await;
                    self.listener
                        .on_toggle_settled(message_id.to_string(), false, false)
                        .await;
                    Err(e.into())
                }
            }
        }
    }

    /// 从宿主上下文构造新建收藏的请求体
    async fn build_payload(
        &self,
        chat_id: &str,
        transcript: &crate::fav::host::TranscriptMessage,
    ) -> CreateFavoritePayload {
        let character_id = self.host.character_id().await;
        let group_id = self.host.group_id().await;
        let chat_name = self.host.chat_name().await;
        let character_name = self.host.character_name().await;

        CreateFavoritePayload {
            original_chat_id: chat_id.to_string(),
            original_message_id: transcript.message_id.clone(),
            sender: transcript.sender.clone(),
            role: if transcript.is_user {
                FavoriteRole::User
            } else {
                FavoriteRole::Character
            },
            message_preview: message_preview(&transcript.text, self.preview_limit),
            original_chat_name: chat_display_name(
                chat_name.as_deref(),
                character_id.as_deref(),
                character_name.as_deref(),
                group_id.as_deref(),
            ),
            character_id,
            group_id,
        }
    }

    /// 清理指定消息对应的收藏（消息被删除时的善后）
    ///
    /// 不存在视为成功；返回是否实际删除了收藏
    pub async fn remove_by_message(&self, chat_id: &str, message_id: &str) -> bool {
        match self.api.delete_by_message(chat_id, message_id).await {
            Ok(removed) => removed,
            Err(e) => {
                self.notice(
                    NoticeLevel::Warning,
                    format!("清理已删除消息的收藏失败: {}", e),
                )
                .await;
                false
            }
        }
    }

    /// 按收藏 ID 删除（弹窗里的删除动作）
    ///
    /// 不存在同样算达成目标；返回操作是否成功
    pub async fn remove_by_id(&self, favorite_id: &str) -> bool {
        match self.api.delete_by_id(favorite_id).await {
            Ok(_) => true,
            Err(e) => {
                self.notice(NoticeLevel::Error, format!("删除失败: {}", e))
                    .await;
                false
            }
        }
    }

    /// 更新收藏备注
    pub async fn update_note(&self, favorite_id: &str, note: &str) -> Result<FavoriteItem> {
        match self.api.update_note(favorite_id, note).await {
            Ok(item) => {
                self.notice(NoticeLevel::Success, "备注已更新").await;
                Ok(item)
            }
            Err(e) => {
                let message = match &e {
                    ApiError::NotFound(msg) => format!("更新备注失败: {}", msg),
                    other => format!("更新备注失败: {}", other),
                };
                self.notice(NoticeLevel::Error, message).await;
                Err(e.into())
            }
        }
    }
}

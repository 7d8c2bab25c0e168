//! 收藏扩展客户端核心实现模块
//!
//! 聚合 API、图标同步器和弹窗控制器，并把宿主生命周期事件
//! 映射到对应的动作上

use crate::fav::favorite::api::FavoritesApi;
use crate::fav::favorite::listener::{EmptyFavoritesListener, FavoritesListener};
use crate::fav::favorite::service::FavoritesSyncer;
use crate::fav::favorite::surface::{ChatSurface, EmptyChatSurface};
use crate::fav::host::{
    ChatNavigator, DialogHost, EmptyChatNavigator, EmptyDialogHost, EmptyHostContext, HostContext,
};
use crate::fav::popup::service::PopupController;
use crate::fav::popup::view::{EmptyPopupView, PopupView};
use crate::fav::types::{HostEvent, NoticeLevel};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// 宿主 HTTP API 基础地址，例如 `http://localhost:8000`
    pub api_base_url: String,
    /// 后端插件 ID（必须与后端插件注册的 ID 一致）
    pub plugin_id: String,
    /// CSRF token，空串表示不携带
    pub csrf_token: String,
    /// 弹窗每页条数
    pub page_size: usize,
    /// 收藏预览截取的最大字符数
    pub preview_limit: usize,
}

impl ClientConfig {
    /// 创建默认配置
    pub fn new(api_base_url: String) -> Self {
        Self {
            api_base_url,
            plugin_id: "favorites_manager".to_string(),
            csrf_token: String::new(),
            page_size: 10,
            preview_limit: 300,
        }
    }

    /// 插件 API 根路径：`{api_base_url}/api/plugins/{plugin_id}`
    pub fn plugin_api_base(&self) -> String {
        format!(
            "{}/api/plugins/{}",
            self.api_base_url.trim_end_matches('/'),
            self.plugin_id
        )
    }
}

/// 等待聊天切换完成的跳转目标
struct PendingJump {
    chat_id: String,
    message_id: String,
}

/// 收藏扩展客户端
///
/// 协作方 seam 都通过 setter 注入，未注入的使用空实现；
/// `start()` 之后才能执行网络操作
#[derive(Clone)]
pub struct FavoritesClient {
    pub(crate) config: ClientConfig,
    host: Arc<dyn HostContext>,
    surface: Arc<dyn ChatSurface>,
    view: Arc<dyn PopupView>,
    dialogs: Arc<dyn DialogHost>,
    navigator: Arc<dyn ChatNavigator>,
    listener: Arc<dyn FavoritesListener>,
    // start() 之后才存在
    syncer: Option<Arc<FavoritesSyncer>>,
    popup: Option<Arc<PopupController>>,
    // 跳转目标：等下一次 ChatChanged 事件消费
    pending_jump: Arc<Mutex<Option<PendingJump>>>,
}

impl FavoritesClient {
    /// 创建新的客户端
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            host: Arc::new(EmptyHostContext),
            surface: Arc::new(EmptyChatSurface),
            view: Arc::new(EmptyPopupView),
            dialogs: Arc::new(EmptyDialogHost),
            navigator: Arc::new(EmptyChatNavigator),
            listener: Arc::new(EmptyFavoritesListener),
            syncer: None,
            popup: None,
            pending_jump: Arc::new(Mutex::new(None)),
        }
    }

    /// 注册宿主上下文
    pub fn set_host_context(&mut self, host: Arc<dyn HostContext>) {
        self.host = host;
    }

    /// 注册聊天视图表面
    pub fn set_chat_surface(&mut self, surface: Arc<dyn ChatSurface>) {
        self.surface = surface;
    }

    /// 注册弹窗视图
    pub fn set_popup_view(&mut self, view: Arc<dyn PopupView>) {
        self.view = view;
    }

    /// 注册对话框宿主
    pub fn set_dialog_host(&mut self, dialogs: Arc<dyn DialogHost>) {
        self.dialogs = dialogs;
    }

    /// 注册聊天导航
    pub fn set_chat_navigator(&mut self, navigator: Arc<dyn ChatNavigator>) {
        self.navigator = navigator;
    }

    /// 注册收藏监听器
    pub fn set_favorites_listener(&mut self, listener: Arc<dyn FavoritesListener>) {
        self.listener = listener;
    }

    /// 启动客户端：构建 HTTP 客户端与各服务，然后做一次初始的
    /// 图标插入 + 全量刷新
    pub async fn start(&mut self) -> Result<()> {
        info!(
            "[Client] 🚀 启动收藏客户端，插件路径: {}",
            self.config.plugin_api_base()
        );

        // 认证通过 default_headers 自动附加到每个请求
        let mut headers = reqwest::header::HeaderMap::new();
        if !self.config.csrf_token.is_empty() {
            headers.insert(
                reqwest::header::HeaderName::from_static("x-csrf-token"),
                reqwest::header::HeaderValue::from_str(&self.config.csrf_token)
                    .context("无效的 CSRF token")?,
            );
        }
        let http_client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .build()
            .context("创建 HTTP 客户端失败")?;

        let base = reqwest::Url::parse(&self.config.plugin_api_base())
            .context("插件 API 地址不合法")?;
        let api = FavoritesApi::new(http_client, base);

        let syncer = Arc::new(FavoritesSyncer::new(
            api,
            self.host.clone(),
            self.surface.clone(),
            self.listener.clone(),
            self.config.preview_limit,
        ));
        let popup = Arc::new(PopupController::new(
            syncer.clone(),
            self.host.clone(),
            self.view.clone(),
            self.dialogs.clone(),
            self.listener.clone(),
            self.config.page_size,
        ));
        self.syncer = Some(syncer.clone());
        self.popup = Some(popup);

        syncer.ensure_toggle_controls().await;
        syncer.refresh_icons().await;
        info!("[Client] ✅ 收藏客户端启动完成");
        Ok(())
    }

    fn syncer(&self) -> Result<&Arc<FavoritesSyncer>> {
        self.syncer
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("客户端尚未启动，请先调用 start()"))
    }

    fn popup(&self) -> Result<&Arc<PopupController>> {
        self.popup
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("客户端尚未启动，请先调用 start()"))
    }

    /// 切换一条消息的收藏状态，并在弹窗正显示当前聊天时刷新弹窗内容
    ///
    /// 返回落定后的收藏状态
    pub async fn toggle_favorite(&self, message_id: &str) -> Result<bool> {
        let favorited = self.syncer()?.toggle_favorite(message_id).await?;
        if let Some(chat_id) = self.host.chat_id().await {
            self.popup()?.handle_external_change(&chat_id).await;
        }
        Ok(favorited)
    }

    /// 收藏图标的点击入口：后台落定，不等待结果（生产点击路径）
    ///
    /// 同一条消息上连续快速点击会竞速，以最后落定的响应为准
    pub fn handle_toggle_click(&self, message_id: String) {
        let client = self.clone();
        tokio::spawn(async move {
            if let Err(e) = client.toggle_favorite(&message_id).await {
                error!("[Client] 收藏切换未能落定: {:?}", e);
            }
        });
    }

    /// 打开收藏夹弹窗
    pub async fn open_favorites_popup(&self) -> Result<()> {
        self.popup()?.open().await
    }

    /// 关闭收藏夹弹窗
    pub async fn close_favorites_popup(&self) -> Result<()> {
        self.popup()?.close().await;
        Ok(())
    }

    /// 弹窗是否打开
    pub async fn is_popup_open(&self) -> bool {
        match self.popup.as_ref() {
            Some(popup) => popup.is_open().await,
            None => false,
        }
    }

    /// 跳转到收藏的来源消息
    ///
    /// 切换宿主聊天并记录待定跳转，滚动在随后的 ChatChanged 事件里进行；
    /// 弹窗会先关闭（跳转后它的过滤上下文已失效）
    pub async fn jump_to_favorite(&self, chat_id: &str, message_id: &str) -> Result<()> {
        self.listener
            .on_notice(
                NoticeLevel::Info,
                format!("正在尝试跳转到聊天 {}...", chat_id),
            )
            .await;
        self.popup()?.close().await;

        {
            let mut pending = self.pending_jump.lock().await;
            *pending = Some(PendingJump {
                chat_id: chat_id.to_string(),
                message_id: message_id.to_string(),
            });
        }

        let navigate = match self.host.group_for_chat(chat_id).await {
            Some(group_id) => {
                info!("[Client] 跳转到群组聊天: {} (聊天: {})", group_id, chat_id);
                self.navigator.open_group_chat(&group_id, chat_id).await
            }
            None => {
                info!("[Client] 跳转到角色聊天: {}", chat_id);
                self.navigator.open_character_chat(chat_id).await
            }
        };

        if let Err(e) = navigate {
            self.pending_jump.lock().await.take();
            self.listener
                .on_notice(NoticeLevel::Error, format!("跳转到聊天失败: {}", e))
                .await;
            return Err(e);
        }
        Ok(())
    }

    /// 消费待定跳转：聊天切换完成后尝试滚动到目标消息
    async fn settle_pending_jump(&self, new_chat_id: Option<&str>) {
        let Some(jump) = self.pending_jump.lock().await.take() else {
            return;
        };

        if new_chat_id != Some(jump.chat_id.as_str()) {
            warn!(
                "[Client] 跳转后切换到了意外的聊天: {:?} (期望 {})",
                new_chat_id, jump.chat_id
            );
            self.listener
                .on_notice(
                    NoticeLevel::Warning,
                    "聊天跳转后加载异常，无法定位消息".to_string(),
                )
                .await;
            return;
        }

        let located = self.surface.scroll_to_message(&jump.message_id).await;
        if located {
            self.listener
                .on_notice(
                    NoticeLevel::Success,
                    format!("已定位到消息 #{}", jump.message_id),
                )
                .await;
        } else {
            // 明确的不支持操作：不猜测历史回填策略
            self.listener
                .on_notice(
                    NoticeLevel::Warning,
                    format!(
                        "消息 #{} 不在当前视图中，暂不支持自动加载历史记录来查找",
                        jump.message_id
                    ),
                )
                .await;
        }
        self.listener
            .on_jump_to_message(jump.chat_id, jump.message_id, located)
            .await;
    }

    /// 宿主生命周期事件入口
    pub async fn handle_host_event(&self, event: HostEvent) -> Result<()> {
        debug!("[Client] 处理宿主事件: {:?}", event);
        match event {
            HostEvent::ChatChanged { chat_id } => {
                // 过滤上下文已失效，先关掉弹窗
                self.popup()?.close().await;
                self.syncer()?.refresh_icons().await;
                self.settle_pending_jump(chat_id.as_deref()).await;
            }
            HostEvent::MessageDeleted { message_id } => {
                // DOM 节点已移除，只需清理后端收藏；不存在则忽略
                let Some(chat_id) = self.host.chat_id().await else {
                    return Ok(());
                };
                let removed = self.syncer()?.remove_by_message(&chat_id, &message_id).await;
                if removed {
                    self.popup()?.handle_external_change(&chat_id).await;
                }
            }
            HostEvent::MessageReceived { .. } | HostEvent::MessageSent { .. } => {
                // 新消息默认未收藏，只需补图标，不拉状态
                self.syncer()?.ensure_toggle_controls().await;
            }
            HostEvent::MessageUpdated { .. } | HostEvent::MessageSwiped { .. } => {
                // 内容变了，收藏关联要按服务端重新校验
                self.syncer()?.refresh_icons().await;
            }
            HostEvent::MoreMessagesLoaded => {
                self.syncer()?.ensure_toggle_controls().await;
                self.syncer()?.refresh_icons().await;
            }
            HostEvent::TranscriptRendered => {
                self.syncer()?.ensure_toggle_controls().await;
            }
        }
        Ok(())
    }
}

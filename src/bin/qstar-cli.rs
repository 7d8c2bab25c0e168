//! 收藏扩展 CLI（测试版）
//!
//! 非交互式 CLI，用于对着真实后端走一遍收藏功能：
//! 插入图标、切换收藏、打开收藏夹弹窗、翻页、关闭

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use qstar_favorites_core::{
    ChatSurface, ClientConfig, DialogHost, FavoritesClient, FavoritesListener, HostContext,
    HostEvent, ListRender, NoticeLevel, PopupView, SidebarEntry, SurfaceMessage,
    TranscriptMessage,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// 收藏扩展 CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "qstar-cli")]
#[command(about = "收藏扩展 CLI - 用于测试和展示收藏功能", long_about = None)]
struct Args {
    /// 宿主 API 基础地址
    #[arg(short, long, default_value = "http://localhost:8000")]
    api_base: String,

    /// CSRF token（空表示不携带）
    #[arg(long, default_value = "")]
    csrf_token: String,

    /// 演示用的聊天 ID
    #[arg(short, long, default_value = "cli-demo-chat")]
    chat_id: String,

    /// 日志级别（默认: info,qstar_favorites_core=debug）
    #[arg(long, default_value = "info,qstar_favorites_core=debug")]
    log_level: String,
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // 创建日志文件（追加模式）
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("无法创建日志文件 debug.log");

    // 输出到 stdout（控制台），保留 ANSI 颜色代码用于终端显示
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 输出到文件，禁用 ANSI 颜色代码（文件不需要颜色）
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("[CLI] 📝 日志已同时输出到控制台和文件: debug.log");
}

/// 固定三条消息的演示聊天上下文
struct CliHost {
    chat_id: String,
    transcript: Vec<TranscriptMessage>,
}

impl CliHost {
    fn new(chat_id: String) -> Self {
        let transcript = vec![
            TranscriptMessage {
                message_id: "0".to_string(),
                sender: "我".to_string(),
                is_user: true,
                text: "今晚的月色真好。".to_string(),
            },
            TranscriptMessage {
                message_id: "1".to_string(),
                sender: "小星".to_string(),
                is_user: false,
                text: "是啊，适合把喜欢的句子收藏起来。".to_string(),
            },
            TranscriptMessage {
                message_id: "2".to_string(),
                sender: "我".to_string(),
                is_user: true,
                text: "那就从这一句开始。".to_string(),
            },
        ];
        Self { chat_id, transcript }
    }
}

#[async_trait]
impl HostContext for CliHost {
    async fn chat_id(&self) -> Option<String> {
        Some(self.chat_id.clone())
    }

    async fn chat_name(&self) -> Option<String> {
        Some("CLI 演示聊天".to_string())
    }

    async fn character_id(&self) -> Option<String> {
        Some("cli-demo-character".to_string())
    }

    async fn character_name(&self) -> Option<String> {
        Some("小星".to_string())
    }

    async fn group_id(&self) -> Option<String> {
        None
    }

    async fn group_for_chat(&self, _chat_id: &str) -> Option<String> {
        None
    }

    async fn transcript_message(&self, message_id: &str) -> Option<TranscriptMessage> {
        self.transcript
            .iter()
            .find(|m| m.message_id == message_id)
            .cloned()
    }

    async fn format_preview(&self, text: &str, _sender: &str, _is_user: bool) -> String {
        text.to_string()
    }
}

/// 内存里的聊天表面：打印每一次图标变化
struct CliSurface {
    messages: Mutex<Vec<SurfaceMessage>>,
}

impl CliSurface {
    fn new(message_ids: &[&str]) -> Self {
        let messages = message_ids
            .iter()
            .map(|id| SurfaceMessage {
                message_id: id.to_string(),
                has_toggle: false,
                favorited: false,
            })
            .collect();
        Self {
            messages: Mutex::new(messages),
        }
    }
}

#[async_trait]
impl ChatSurface for CliSurface {
    async fn visible_messages(&self) -> Vec<SurfaceMessage> {
        self.messages.lock().await.clone()
    }

    async fn insert_toggle(&self, message_id: &str) {
        info!("[CLI/Surface] ⭐ 插入收藏图标: #{}", message_id);
        if let Some(message) = self
            .messages
            .lock()
            .await
            .iter_mut()
            .find(|m| m.message_id == message_id)
        {
            message.has_toggle = true;
        }
    }

    async fn set_toggle_state(&self, message_id: &str, favorited: bool) {
        info!(
            "[CLI/Surface] {} 消息 #{} -> {}",
            if favorited { "🌟" } else { "✩" },
            message_id,
            if favorited { "已收藏" } else { "未收藏" }
        );
        if let Some(message) = self
            .messages
            .lock()
            .await
            .iter_mut()
            .find(|m| m.message_id == message_id)
        {
            message.favorited = favorited;
        }
    }

    async fn scroll_to_message(&self, message_id: &str) -> bool {
        let found = self
            .messages
            .lock()
            .await
            .iter()
            .any(|m| m.message_id == message_id);
        info!("[CLI/Surface] 🔍 滚动到消息 #{}: {}", message_id, found);
        found
    }
}

/// 打印渲染结果的弹窗视图
struct CliPopupView;

#[async_trait]
impl PopupView for CliPopupView {
    async fn show(&self) {
        info!("[CLI/Popup] 📖 弹窗打开");
    }

    async fn render_sidebar(&self, entries: Vec<SidebarEntry>) {
        info!("[CLI/Popup] 侧边栏（{} 项）:", entries.len());
        for entry in entries {
            info!(
                "[CLI/Popup]   {} {}",
                if entry.selected { "▶" } else { " " },
                entry.label
            );
        }
    }

    async fn render_list(&self, render: ListRender) {
        info!(
            "[CLI/Popup] {} （第 {}/{} 页）",
            render.status, render.page, render.total_pages
        );
        if render.cards.is_empty() {
            info!("[CLI/Popup]   没有找到符合条件的收藏项");
        }
        for card in render.cards {
            info!(
                "[CLI/Popup]   [{}] {} / #{} | {} | {}",
                card.favorite_id, card.chat_label, card.message_id, card.sender, card.added_time
            );
            if card.note_visible {
                info!("[CLI/Popup]     备注: {}", card.note);
            }
            info!("[CLI/Popup]     {}", card.preview);
        }
    }

    async fn patch_note(&self, favorite_id: &str, note: &str, visible: bool) {
        info!(
            "[CLI/Popup] ✏️ 备注更新: {} -> {:?} (显示: {})",
            favorite_id, note, visible
        );
    }

    async fn close(&self) {
        info!("[CLI/Popup] 📕 弹窗关闭");
    }
}

/// 演示用对话框：一律确认，备注输入固定文本
struct CliDialog;

#[async_trait]
impl DialogHost for CliDialog {
    async fn confirm(&self, prompt: &str) -> bool {
        info!("[CLI/Dialog] ❓ {} -> 确认", prompt);
        true
    }

    async fn input(&self, prompt: &str, initial: &str) -> Option<String> {
        info!("[CLI/Dialog] ✏️ {} (初值: {:?})", prompt, initial);
        Some("CLI 演示备注".to_string())
    }
}

/// 打印所有通知和回调的监听器
struct CliListener;

#[async_trait]
impl FavoritesListener for CliListener {
    async fn on_notice(&self, level: NoticeLevel, message: String) {
        match level {
            NoticeLevel::Success => info!("[CLI/Notice] ✅ {}", message),
            NoticeLevel::Info => info!("[CLI/Notice] 💡 {}", message),
            NoticeLevel::Warning => info!("[CLI/Notice] ⚠️ {}", message),
            NoticeLevel::Error => error!("[CLI/Notice] ❌ {}", message),
        }
    }

    async fn on_toggle_settled(&self, message_id: String, favorited: bool, confirmed: bool) {
        info!(
            "[CLI/Notice] 🔁 切换落定: #{} favorited={} confirmed={}",
            message_id, favorited, confirmed
        );
    }

    async fn on_jump_to_message(&self, chat_id: String, message_id: String, located: bool) {
        info!(
            "[CLI/Notice] 🧭 跳转结果: 聊天 {} 消息 #{} located={}",
            chat_id, message_id, located
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志
    init_logger(&args.log_level);

    info!("[CLI] 🚀 收藏扩展 CLI（测试模式）");
    info!("[CLI] 🌐 API 地址: {}", args.api_base);
    info!("[CLI] 💬 聊天 ID: {}", args.chat_id);

    let mut config = ClientConfig::new(args.api_base.clone());
    config.csrf_token = args.csrf_token.clone();

    let mut client = FavoritesClient::new(config);
    client.set_host_context(Arc::new(CliHost::new(args.chat_id.clone())));
    client.set_chat_surface(Arc::new(CliSurface::new(&["0", "1", "2"])));
    client.set_popup_view(Arc::new(CliPopupView));
    client.set_dialog_host(Arc::new(CliDialog));
    client.set_favorites_listener(Arc::new(CliListener));

    info!("[CLI] 🔗 正在启动客户端...");
    client
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("启动失败: {}", e))?;
    info!("[CLI] ✅ 启动完成，图标已就绪");

    // 收藏一条消息
    info!("[CLI] ---- 收藏消息 #1 ----");
    match client.toggle_favorite("1").await {
        Ok(favorited) => info!("[CLI] 切换完成，当前状态: favorited={}", favorited),
        Err(e) => error!("[CLI] 切换失败: {:?}", e),
    }

    // 浏览收藏夹
    info!("[CLI] ---- 打开收藏夹 ----");
    client
        .open_favorites_popup()
        .await
        .map_err(|e| anyhow::anyhow!("打开收藏夹失败: {}", e))?;

    // 模拟宿主事件：新消息只补图标
    client
        .handle_host_event(HostEvent::MessageSent {
            message_id: "2".to_string(),
        })
        .await?;

    info!("[CLI] ---- 关闭收藏夹并取消收藏 ----");
    client.close_favorites_popup().await?;
    match client.toggle_favorite("1").await {
        Ok(favorited) => info!("[CLI] 切换完成，当前状态: favorited={}", favorited),
        Err(e) => error!("[CLI] 切换失败: {:?}", e),
    }

    info!("[CLI] 👋 演示结束");
    Ok(())
}

//! 单测共用的桩实现
//!
//! 录制型的表面/视图/监听器，用于断言涂刷顺序与通知内容

use crate::fav::favorite::listener::FavoritesListener;
use crate::fav::favorite::surface::{ChatSurface, SurfaceMessage};
use crate::fav::host::{ChatNavigator, DialogHost, HostContext, TranscriptMessage};
use crate::fav::popup::view::{ListRender, PopupView, SidebarEntry};
use crate::fav::types::NoticeLevel;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, Once};

static INIT_LOGGER: Once = Once::new();

/// 测试中默认打开当前 crate 的 debug，关闭底层 HTTP 客户端的 debug 噪音
pub(crate) fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::EnvFilter;

        let filter_layer =
            EnvFilter::new("info,qstar_favorites_core=debug,hyper_util::client=info,reqwest=info");

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_target(false)
            .with_test_writer();

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    });
}

/// 可变的宿主上下文桩
pub(crate) struct StubHost {
    pub chat_id: Mutex<Option<String>>,
    pub chat_name: Option<String>,
    pub character_id: Option<String>,
    pub character_name: Option<String>,
    pub group_id: Option<String>,
    /// chat_id -> group_id 的映射（group_for_chat 查询用）
    pub groups: HashMap<String, String>,
    pub transcript: Vec<TranscriptMessage>,
}

impl StubHost {
    pub fn with_chat(chat_id: &str) -> Self {
        Self {
            chat_id: Mutex::new(Some(chat_id.to_string())),
            chat_name: Some("夜谈".to_string()),
            character_id: Some("char-1".to_string()),
            character_name: Some("小星".to_string()),
            group_id: None,
            groups: HashMap::new(),
            transcript: Vec::new(),
        }
    }

    pub fn without_chat() -> Self {
        Self {
            chat_id: Mutex::new(None),
            chat_name: None,
            character_id: None,
            character_name: None,
            group_id: None,
            groups: HashMap::new(),
            transcript: Vec::new(),
        }
    }

    pub fn with_message(mut self, message_id: &str, text: &str) -> Self {
        self.transcript.push(TranscriptMessage {
            message_id: message_id.to_string(),
            sender: "我".to_string(),
            is_user: true,
            text: text.to_string(),
        });
        self
    }

    pub fn set_chat(&self, chat_id: Option<&str>) {
        *self.chat_id.lock().unwrap() = chat_id.map(|s| s.to_string());
    }
}

#[async_trait]
impl HostContext for StubHost {
    async fn chat_id(&self) -> Option<String> {
        self.chat_id.lock().unwrap().clone()
    }

    async fn chat_name(&self) -> Option<String> {
        self.chat_name.clone()
    }

    async fn character_id(&self) -> Option<String> {
        self.character_id.clone()
    }

    async fn character_name(&self) -> Option<String> {
        self.character_name.clone()
    }

    async fn group_id(&self) -> Option<String> {
        self.group_id.clone()
    }

    async fn group_for_chat(&self, chat_id: &str) -> Option<String> {
        self.groups.get(chat_id).cloned()
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

/// 录制型聊天表面：记录插入和每一次状态涂刷
#[derive(Default)]
pub(crate) struct RecordingSurface {
    pub messages: Mutex<Vec<SurfaceMessage>>,
    pub inserted: Mutex<Vec<String>>,
    /// 按发生顺序记录的 (message_id, favorited) 涂刷
    pub paints: Mutex<Vec<(String, bool)>>,
}

impl RecordingSurface {
    pub fn with_messages(ids: &[(&str, bool, bool)]) -> Self {
        let surface = Self::default();
        {
            let mut messages = surface.messages.lock().unwrap();
            for (id, has_toggle, favorited) in ids {
                messages.push(SurfaceMessage {
                    message_id: id.to_string(),
                    has_toggle: *has_toggle,
                    favorited: *favorited,
                });
            }
        }
        surface
    }

    pub fn paints(&self) -> Vec<(String, bool)> {
        self.paints.lock().unwrap().clone()
    }

    pub fn inserted(&self) -> Vec<String> {
        self.inserted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatSurface for RecordingSurface {
    async fn visible_messages(&self) -> Vec<SurfaceMessage> {
        self.messages.lock().unwrap().clone()
    }

    async fn insert_toggle(&self, message_id: &str) {
        self.inserted.lock().unwrap().push(message_id.to_string());
        if let Some(message) = self
            .messages
            .lock()
            .unwrap()
            .iter_mut()
            .find(|m| m.message_id == message_id)
        {
            message.has_toggle = true;
        }
    }

    async fn set_toggle_state(&self, message_id: &str, favorited: bool) {
        self.paints
            .lock()
            .unwrap()
            .push((message_id.to_string(), favorited));
        if let Some(message) = self
            .messages
            .lock()
            .unwrap()
            .iter_mut()
            .find(|m| m.message_id == message_id)
        {
            message.favorited = favorited;
        }
    }

    async fn scroll_to_message(&self, message_id: &str) -> bool {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .any(|m| m.message_id == message_id)
    }
}

/// 录制型监听器：保存通知与切换落定记录
#[derive(Default)]
pub(crate) struct RecordingListener {
    pub notices: Mutex<Vec<(NoticeLevel, String)>>,
    pub settles: Mutex<Vec<(String, bool, bool)>>,
    pub jumps: Mutex<Vec<(String, String, bool)>>,
}

impl RecordingListener {
    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().unwrap().clone()
    }

    pub fn settles(&self) -> Vec<(String, bool, bool)> {
        self.settles.lock().unwrap().clone()
    }

    pub fn jumps(&self) -> Vec<(String, String, bool)> {
        self.jumps.lock().unwrap().clone()
    }
}

#[async_trait]
impl FavoritesListener for RecordingListener {
    async fn on_notice(&self, level: NoticeLevel, message: String) {
        self.notices.lock().unwrap().push((level, message));
    }

    async fn on_toggle_settled(&self, message_id: String, favorited: bool, confirmed: bool) {
        self.settles
            .lock()
            .unwrap()
            .push((message_id, favorited, confirmed));
    }

    async fn on_jump_to_message(&self, chat_id: String, message_id: String, located: bool) {
        self.jumps.lock().unwrap().push((chat_id, message_id, located));
    }
}

/// 录制型弹窗视图
#[derive(Default)]
pub(crate) struct RecordingView {
    pub open: Mutex<bool>,
    pub sidebars: Mutex<Vec<Vec<SidebarEntry>>>,
    pub renders: Mutex<Vec<ListRender>>,
    pub patches: Mutex<Vec<(String, String, bool)>>,
}

impl RecordingView {
    pub fn is_open(&self) -> bool {
        *self.open.lock().unwrap()
    }

    pub fn last_render(&self) -> Option<ListRender> {
        self.renders.lock().unwrap().last().cloned()
    }

    pub fn last_sidebar(&self) -> Option<Vec<SidebarEntry>> {
        self.sidebars.lock().unwrap().last().cloned()
    }

    pub fn patches(&self) -> Vec<(String, String, bool)> {
        self.patches.lock().unwrap().clone()
    }
}

#[async_trait]
impl PopupView for RecordingView {
    async fn show(&self) {
        *self.open.lock().unwrap() = true;
    }

    async fn render_sidebar(&self, entries: Vec<SidebarEntry>) {
        self.sidebars.lock().unwrap().push(entries);
    }

    async fn render_list(&self, render: ListRender) {
        self.renders.lock().unwrap().push(render);
    }

    async fn patch_note(&self, favorite_id: &str, note: &str, visible: bool) {
        self.patches.lock().unwrap().push((
            favorite_id.to_string(),
            note.to_string(),
            visible,
        ));
    }

    async fn close(&self) {
        *self.open.lock().unwrap() = false;
    }
}

/// 脚本化对话框：预先给定确认结果与输入内容
pub(crate) struct ScriptedDialog {
    pub confirm: bool,
    pub input: Option<String>,
}

#[async_trait]
impl DialogHost for ScriptedDialog {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.confirm
    }

    async fn input(&self, _prompt: &str, _initial: &str) -> Option<String> {
        self.input.clone()
    }
}

/// 录制型聊天导航
#[derive(Default)]
pub(crate) struct RecordingNavigator {
    pub opened: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatNavigator for RecordingNavigator {
    async fn open_character_chat(&self, chat_id: &str) -> anyhow::Result<()> {
        self.opened.lock().unwrap().push(format!("char:{}", chat_id));
        Ok(())
    }

    async fn open_group_chat(&self, group_id: &str, chat_id: &str) -> anyhow::Result<()> {
        self.opened
            .lock()
            .unwrap()
            .push(format!("group:{}:{}", group_id, chat_id));
        Ok(())
    }
}

/// 构造一条收藏的 JSON 响应体
pub(crate) fn favorite_json(id: &str, chat_id: &str, message_id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "originalChatId": chat_id,
        "originalMessageId": message_id,
        "sender": "小星",
        "role": "character",
        "characterId": "char-1",
        "groupId": null,
        "messagePreview": "预览文本",
        "note": null,
        "addedTimestamp": 1713350000000i64,
        "originalChatName": "夜谈"
    })
}

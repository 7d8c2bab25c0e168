//! 宿主应用协作接口
//!
//! 本 crate 不直接触碰任何具体 UI，宿主的上下文、对话框与聊天导航
//! 都通过这里的 trait 注入，未注册时使用对应的空实现

use async_trait::async_trait;

/// 宿主聊天记录中的一条消息（收藏时用于构造预览快照）
#[derive(Debug, Clone)]
pub struct TranscriptMessage {
    /// 消息 ID（宿主侧的 mesid，字符串形式的消息索引）
    pub message_id: String,
    /// 发送者显示名
    pub sender: String,
    /// 是否为用户自己发送
    pub is_user: bool,
    /// 消息正文
    pub text: String,
}

/// 宿主环境上下文（活动聊天、角色/群组、消息记录）
#[async_trait]
pub trait HostContext: Send + Sync {
    /// 当前活动聊天 ID，没有打开的聊天时返回 None
    async fn chat_id(&self) -> Option<String>;

    /// 当前聊天的显示名称
    async fn chat_name(&self) -> Option<String>;

    /// 当前角色 ID（角色聊天时存在）
    async fn character_id(&self) -> Option<String>;

    /// 当前角色显示名
    async fn character_name(&self) -> Option<String>;

    /// 当前群组 ID（群组聊天时存在）
    async fn group_id(&self) -> Option<String>;

    /// 查询某个聊天 ID 是否属于群组，属于则返回群组 ID
    async fn group_for_chat(&self, chat_id: &str) -> Option<String>;

    /// 按消息 ID 读取当前聊天记录中的消息
    async fn transcript_message(&self, message_id: &str) -> Option<TranscriptMessage>;

    /// 用宿主的消息格式化函数渲染预览文本
    async fn format_preview(&self, text: &str, sender: &str, is_user: bool) -> String;
}

/// 默认空实现：没有任何上下文，预览原样返回
pub struct EmptyHostContext;

#[async_trait]
impl HostContext for EmptyHostContext {
    async fn chat_id(&self) -> Option<String> {
        None
    }

    async fn chat_name(&self) -> Option<String> {
        None
    }

    async fn character_id(&self) -> Option<String> {
        None
    }

    async fn character_name(&self) -> Option<String> {
        None
    }

    async fn group_id(&self) -> Option<String> {
        None
    }

    async fn group_for_chat(&self, _chat_id: &str) -> Option<String> {
        None
    }

    async fn transcript_message(&self, _message_id: &str) -> Option<TranscriptMessage> {
        None
    }

    async fn format_preview(&self, text: &str, _sender: &str, _is_user: bool) -> String {
        text.to_string()
    }
}

/// 宿主的通用确认/输入对话框
#[async_trait]
pub trait DialogHost: Send + Sync {
    /// 确认对话框，返回用户是否点击了确定
    async fn confirm(&self, prompt: &str) -> bool;

    /// 文本输入对话框，取消时返回 None
    async fn input(&self, prompt: &str, initial: &str) -> Option<String>;
}

/// 默认空实现：一律取消
pub struct EmptyDialogHost;

#[async_trait]
impl DialogHost for EmptyDialogHost {
    async fn confirm(&self, _prompt: &str) -> bool {
        false
    }

    async fn input(&self, _prompt: &str, _initial: &str) -> Option<String> {
        None
    }
}

/// 宿主的聊天导航能力（跳转到来源聊天时使用）
#[async_trait]
pub trait ChatNavigator: Send + Sync {
    /// 打开角色聊天（参数为聊天文件 ID）
    async fn open_character_chat(&self, chat_id: &str) -> anyhow::Result<()>;

    /// 打开群组内的指定聊天
    async fn open_group_chat(&self, group_id: &str, chat_id: &str) -> anyhow::Result<()>;
}

/// 默认空实现（无操作）
pub struct EmptyChatNavigator;

#[async_trait]
impl ChatNavigator for EmptyChatNavigator {
    async fn open_character_chat(&self, _chat_id: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn open_group_chat(&self, _group_id: &str, _chat_id: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

//! 收藏数据模型定义
//!
//! 与后端收藏服务的 JSON 字段一一对应（camelCase），本层只做只读快照，
//! 每次渲染前都会重新拉取，不在本地长期持有

use serde::{Deserialize, Serialize};

/// 收藏来源消息的作者角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteRole {
    User,
    /// 角色消息；后端返回未知取值时也归入此类（仅用于展示）
    #[serde(other)]
    Character,
}

/// 收藏项（后端持有权威数据，本层视为不可变 DTO）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    /// 收藏唯一 ID
    pub id: String,
    /// 来源聊天 ID
    pub original_chat_id: String,
    /// 来源消息 ID（宿主的 mesid 字符串）
    pub original_message_id: String,
    /// 来源消息发送者显示名
    pub sender: String,
    /// 发送者角色
    pub role: FavoriteRole,
    /// 角色 ID（角色聊天时存在）
    #[serde(default)]
    pub character_id: Option<String>,
    /// 群组 ID（群组聊天时存在）
    #[serde(default)]
    pub group_id: Option<String>,
    /// 收藏时截取的消息预览（快照，不随原消息变化）
    #[serde(default)]
    pub message_preview: String,
    /// 用户备注，仅可通过备注更新操作修改
    #[serde(default)]
    pub note: Option<String>,
    /// 收藏时间（毫秒时间戳）
    #[serde(default)]
    pub added_timestamp: i64,
    /// 来源聊天显示名（冗余存储，展示用）
    #[serde(default)]
    pub original_chat_name: Option<String>,
}

/// 相关聊天（同角色/群组下的其他聊天，仅用于侧边栏）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedChat {
    pub chat_id: String,
    pub chat_name: String,
}

/// 新建收藏的请求体
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFavoritePayload {
    pub original_chat_id: String,
    pub original_message_id: String,
    pub sender: String,
    pub role: FavoriteRole,
    pub character_id: Option<String>,
    pub group_id: Option<String>,
    pub message_preview: String,
    pub original_chat_name: String,
}

/// 截取消息预览：最多 `limit` 个字符，被截断时追加 `...`
pub fn message_preview(text: &str, limit: usize) -> String {
    let mut preview: String = text.chars().take(limit).collect();
    if text.chars().count() > limit {
        preview.push_str("...");
    }
    preview
}

/// 推导来源聊天的显示名
///
/// 优先用宿主的聊天名；角色聊天退化为角色名，群组聊天退化为
/// `群聊 <群组 ID 前 8 个字符>` 标签
pub fn chat_display_name(
    chat_name: Option<&str>,
    character_id: Option<&str>,
    character_name: Option<&str>,
    group_id: Option<&str>,
) -> String {
    if let Some(name) = chat_name {
        if !name.is_empty() {
            return name.to_string();
        }
    }
    if character_id.is_some() {
        return character_name.unwrap_or_default().to_string();
    }
    let group_label: String = group_id.unwrap_or_default().chars().take(8).collect();
    format!("群聊 {}", group_label)
}

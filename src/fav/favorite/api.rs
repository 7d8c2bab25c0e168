//! 收藏服务 HTTP API 客户端
//!
//! 负责所有收藏相关的 HTTP 请求，纯请求/响应，不重试不排队

use crate::fav::error::ApiError;
use crate::fav::favorite::models::{CreateFavoritePayload, FavoriteItem, RelatedChat};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 后端错误响应体（`{"error": "..."}`）
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// 收藏相关的 HTTP API 客户端
pub struct FavoritesApi {
    client: reqwest::Client,
    /// 插件 API 根路径，例如 `http://host/api/plugins/favorites_manager`
    base: reqwest::Url,
}

impl FavoritesApi {
    /// 创建新的收藏 API 客户端
    ///
    /// `client` 应该已经在外部配置好认证请求头
    pub fn new(client: reqwest::Client, base: reqwest::Url) -> Self {
        Self { client, base }
    }

    /// 在插件根路径上拼接路径段（自动做百分号编码）
    fn endpoint(&self, segments: &[&str]) -> reqwest::Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// 从失败响应中提取错误信息（优先 body 中的 error 字段）
    fn extract_error(status: StatusCode, body: &[u8]) -> String {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) => parsed.error,
            Err(_) => format!("HTTP {}", status),
        }
    }

    /// 获取收藏列表
    ///
    /// 过滤参数按存在与否拼接；全部为 None 时等价于“所有收藏”
    pub async fn list_favorites(
        &self,
        chat_id: Option<&str>,
        character_id: Option<&str>,
        group_id: Option<&str>,
    ) -> Result<Vec<FavoriteItem>, ApiError> {
        let operation_id = Uuid::new_v4().to_string();
        let mut url = self.endpoint(&["favorites"]);
        {
            let mut query = url.query_pairs_mut();
            if let Some(chat_id) = chat_id {
                query.append_pair("chatId", chat_id);
            }
            if let Some(character_id) = character_id {
                query.append_pair("characterId", character_id);
            }
            if let Some(group_id) = group_id {
                query.append_pair("groupId", group_id);
            }
        }

        info!("[FavAPI] 📡 请求收藏列表");
        debug!("[FavAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .get(url)
            .header("operationID", &operation_id)
            .send()
            .await?;

        let status = response.status();
        let body_bytes = response.bytes().await?;

        if !status.is_success() {
            let message = Self::extract_error(status, &body_bytes);
            error!(
                "[FavAPI] 收藏列表请求失败，HTTP状态: {}, 响应: {}",
                status, message
            );
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let items: Vec<FavoriteItem> = serde_json::from_slice(&body_bytes)?;
        info!("[FavAPI] ✅ 收藏列表响应，条目数: {}", items.len());
        Ok(items)
    }

    /// 获取当前角色/群组的相关聊天列表（用于侧边栏）
    pub async fn list_related_chats(
        &self,
        character_id: Option<&str>,
        group_id: Option<&str>,
    ) -> Result<Vec<RelatedChat>, ApiError> {
        let operation_id = Uuid::new_v4().to_string();
        let mut url = self.endpoint(&["related-chats"]);
        {
            let mut query = url.query_pairs_mut();
            if let Some(character_id) = character_id {
                query.append_pair("characterId", character_id);
            }
            if let Some(group_id) = group_id {
                query.append_pair("groupId", group_id);
            }
        }

        info!("[FavAPI] 📡 请求相关聊天列表");
        debug!("[FavAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .get(url)
            .header("operationID", &operation_id)
            .send()
            .await?;

        let status = response.status();
        let body_bytes = response.bytes().await?;

        if !status.is_success() {
            let message = Self::extract_error(status, &body_bytes);
            error!(
                "[FavAPI] 相关聊天列表请求失败，HTTP状态: {}, 响应: {}",
                status, message
            );
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let chats: Vec<RelatedChat> = serde_json::from_slice(&body_bytes)?;
        info!("[FavAPI] ✅ 相关聊天列表响应，条目数: {}", chats.len());
        Ok(chats)
    }

    /// 新建收藏
    ///
    /// 后端对 (聊天, 消息) 去重，重复收藏返回 HTTP 409
    pub async fn create_favorite(
        &self,
        payload: &CreateFavoritePayload,
    ) -> Result<FavoriteItem, ApiError> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.endpoint(&["favorites"]);

        info!(
            "[FavAPI] 📡 新建收藏，聊天: {}, 消息: {}",
            payload.original_chat_id, payload.original_message_id
        );
        debug!("[FavAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(url)
            .header("operationID", &operation_id)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body_bytes = response.bytes().await?;

        if status == StatusCode::CONFLICT {
            let message = Self::extract_error(status, &body_bytes);
            warn!("[FavAPI] 重复收藏: {}", message);
            return Err(ApiError::Conflict(if message.starts_with("HTTP") {
                "消息已被收藏".to_string()
            } else {
                message
            }));
        }

        if !status.is_success() {
            let message = Self::extract_error(status, &body_bytes);
            error!(
                "[FavAPI] 新建收藏请求失败，HTTP状态: {}, 响应: {}",
                status, message
            );
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let item: FavoriteItem = serde_json::from_slice(&body_bytes)?;
        info!("[FavAPI] ✅ 收藏成功，ID: {}", item.id);
        Ok(item)
    }

    /// 按来源消息位置删除收藏
    ///
    /// 返回是否实际删除了收藏；HTTP 404 视为幂等成功（目标状态已达成），
    /// 返回 `Ok(false)`
    pub async fn delete_by_message(
        &self,
        chat_id: &str,
        message_id: &str,
    ) -> Result<bool, ApiError> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.endpoint(&["favorites", "by-message", chat_id, message_id]);

        info!(
            "[FavAPI] 📡 按消息删除收藏，聊天: {}, 消息: {}",
            chat_id, message_id
        );
        debug!("[FavAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .delete(url)
            .header("operationID", &operation_id)
            .send()
            .await?;

        let status = response.status();
        let body_bytes = response.bytes().await?;

        if status == StatusCode::NOT_FOUND {
            warn!(
                "[FavAPI] 未找到要删除的收藏 (聊天: {}, 消息: {})",
                chat_id, message_id
            );
            return Ok(false);
        }

        if !status.is_success() {
            let message = Self::extract_error(status, &body_bytes);
            error!(
                "[FavAPI] 按消息删除收藏失败，HTTP状态: {}, 响应: {}",
                status, message
            );
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        info!("[FavAPI] ✅ 按消息删除收藏成功");
        Ok(true)
    }

    /// 按收藏 ID 删除收藏（主要用于弹窗）
    ///
    /// HTTP 404 同样视为幂等成功，返回 `Ok(false)`
    pub async fn delete_by_id(&self, favorite_id: &str) -> Result<bool, ApiError> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.endpoint(&["favorites", favorite_id]);

        info!("[FavAPI] 📡 按ID删除收藏: {}", favorite_id);
        debug!("[FavAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .delete(url)
            .header("operationID", &operation_id)
            .send()
            .await?;

        let status = response.status();
        let body_bytes = response.bytes().await?;

        if status == StatusCode::NOT_FOUND {
            warn!("[FavAPI] 未找到要删除的收藏 (ID: {})", favorite_id);
            return Ok(false);
        }

        if !status.is_success() {
            let message = Self::extract_error(status, &body_bytes);
            error!(
                "[FavAPI] 按ID删除收藏失败，HTTP状态: {}, 响应: {}",
                status, message
            );
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        info!("[FavAPI] ✅ 按ID删除收藏成功: {}", favorite_id);
        Ok(true)
    }

    /// 更新收藏备注
    ///
    /// 与删除不同，这里的 HTTP 404 是硬错误（更新目标必须存在）
    pub async fn update_note(
        &self,
        favorite_id: &str,
        note: &str,
    ) -> Result<FavoriteItem, ApiError> {
        let operation_id = Uuid::new_v4().to_string();
        let url = self.endpoint(&["favorites", favorite_id, "note"]);

        info!("[FavAPI] 📡 更新收藏备注: {}", favorite_id);
        debug!("[FavAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .put(url)
            .header("operationID", &operation_id)
            .json(&serde_json::json!({ "note": note }))
            .send()
            .await?;

        let status = response.status();
        let body_bytes = response.bytes().await?;

        if status == StatusCode::NOT_FOUND {
            error!("[FavAPI] 未找到要更新的收藏项 (ID: {})", favorite_id);
            return Err(ApiError::NotFound("未找到要更新的收藏项".to_string()));
        }

        if !status.is_success() {
            let message = Self::extract_error(status, &body_bytes);
            error!(
                "[FavAPI] 更新备注失败，HTTP状态: {}, 响应: {}",
                status, message
            );
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let item: FavoriteItem = serde_json::from_slice(&body_bytes)?;
        info!("[FavAPI] ✅ 备注更新成功 (ID: {})", item.id);
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fav::favorite::models::FavoriteRole;
    use crate::fav::testkit::favorite_json;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> FavoritesApi {
        let base = reqwest::Url::parse(&format!("{}/api/plugins/favorites_manager", server.uri()))
            .expect("测试 URL 应当合法");
        FavoritesApi::new(reqwest::Client::new(), base)
    }

    #[tokio::test]
    async fn list_favorites_passes_chat_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/plugins/favorites_manager/favorites"))
            .and(query_param("chatId", "chat-abc"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([favorite_json("fav-1", "chat-abc", "12")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        let items = api
            .list_favorites(Some("chat-abc"), None, None)
            .await
            .expect("列表请求应当成功");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].original_message_id, "12");
    }

    #[tokio::test]
    async fn list_related_chats_passes_character_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/plugins/favorites_manager/related-chats"))
            .and(query_param("characterId", "char-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"chatId": "chat-abc", "chatName": "夜谈"},
                {"chatId": "chat-def", "chatName": "旧聊天"}
            ])))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let chats = api
            .list_related_chats(Some("char-1"), None)
            .await
            .expect("相关聊天请求应当成功");
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[1].chat_id, "chat-def");
    }

    #[tokio::test]
    async fn create_favorite_maps_409_to_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/plugins/favorites_manager/favorites"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"error": "消息已被收藏"})),
            )
            .mount(&server)
            .await;

        let api = api_for(&server);
        let payload = CreateFavoritePayload {
            original_chat_id: "chat-abc".to_string(),
            original_message_id: "12".to_string(),
            sender: "我".to_string(),
            role: FavoriteRole::User,
            character_id: None,
            group_id: None,
            message_preview: "预览".to_string(),
            original_chat_name: "夜谈".to_string(),
        };
        let err = api
            .create_favorite(&payload)
            .await
            .expect_err("重复收藏应当返回冲突");
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "消息已被收藏");
    }

    #[tokio::test]
    async fn create_favorite_returns_new_item() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/plugins/favorites_manager/favorites"))
            .and(body_json(json!({
                "originalChatId": "chat-abc",
                "originalMessageId": "12",
                "sender": "我",
                "role": "user",
                "characterId": null,
                "groupId": null,
                "messagePreview": "预览",
                "originalChatName": "夜谈"
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(favorite_json("fav-9", "chat-abc", "12")),
            )
            .mount(&server)
            .await;

        let api = api_for(&server);
        let payload = CreateFavoritePayload {
            original_chat_id: "chat-abc".to_string(),
            original_message_id: "12".to_string(),
            sender: "我".to_string(),
            role: FavoriteRole::User,
            character_id: None,
            group_id: None,
            message_preview: "预览".to_string(),
            original_chat_name: "夜谈".to_string(),
        };
        let item = api
            .create_favorite(&payload)
            .await
            .expect("新建收藏应当成功");
        assert_eq!(item.id, "fav-9");
    }

    #[tokio::test]
    async fn delete_twice_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(
                "/api/plugins/favorites_manager/favorites/by-message/chat-abc/12",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(
                "/api/plugins/favorites_manager/favorites/by-message/chat-abc/12",
            ))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "未找到"})))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let first = api
            .delete_by_message("chat-abc", "12")
            .await
            .expect("首次删除应当成功");
        let second = api
            .delete_by_message("chat-abc", "12")
            .await
            .expect("重复删除应当视为成功");
        assert!(first);
        assert!(!second);
    }

    #[tokio::test]
    async fn delete_by_id_tolerates_404() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/plugins/favorites_manager/favorites/fav-1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "未找到"})))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let removed = api
            .delete_by_id("fav-1")
            .await
            .expect("404 应当视为幂等成功");
        assert!(!removed);
    }

    #[tokio::test]
    async fn update_note_404_is_hard_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/plugins/favorites_manager/favorites/fav-1/note"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "未找到"})))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let err = api
            .update_note("fav-1", "备注")
            .await
            .expect_err("备注更新目标不存在应当报错");
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_note_returns_updated_item() {
        let server = MockServer::start().await;
        let mut body = favorite_json("fav-1", "chat-abc", "12");
        body["note"] = json!("新的备注");
        Mock::given(method("PUT"))
            .and(path("/api/plugins/favorites_manager/favorites/fav-1/note"))
            .and(body_json(json!({"note": "新的备注"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let item = api
            .update_note("fav-1", "新的备注")
            .await
            .expect("备注更新应当成功");
        assert_eq!(item.note.as_deref(), Some("新的备注"));
    }

    #[tokio::test]
    async fn server_error_body_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/plugins/favorites_manager/favorites"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"error": "数据库不可用"})),
            )
            .mount(&server)
            .await;

        let api = api_for(&server);
        let err = api
            .list_favorites(None, None, None)
            .await
            .expect_err("500 应当报错");
        match err {
            ApiError::Http { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "数据库不可用");
            }
            other => panic!("意外的错误类型: {:?}", other),
        }
    }

    #[tokio::test]
    async fn path_segments_are_percent_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(
                "/api/plugins/favorites_manager/favorites/by-message/chat%20a%2Fb/12",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        let removed = api
            .delete_by_message("chat a/b", "12")
            .await
            .expect("带特殊字符的聊天 ID 应当被正确编码");
        assert!(removed);
    }
}

//! 收藏模块
//!
//! 收藏项的 API 访问、图标同步与监听回调

pub mod api;
pub mod listener;
pub mod models;
pub mod service;
pub mod surface;

// 重新导出主要类型和函数
pub use api::FavoritesApi;
pub use listener::{EmptyFavoritesListener, FavoritesListener};
pub use models::{CreateFavoritePayload, FavoriteItem, FavoriteRole, RelatedChat};
pub use service::FavoritesSyncer;
pub use surface::{ChatSurface, EmptyChatSurface, SurfaceMessage};

//! 收藏夹弹窗模块
//!
//! 过滤 + 分页的收藏浏览器

pub mod service;
pub mod view;

// 重新导出主要类型
pub use service::{PopupController, PopupState};
pub use view::{EmptyPopupView, FavoriteCard, ListRender, PopupView, SidebarEntry};

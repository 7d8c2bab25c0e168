pub mod fav;

// 重新导出常用类型和函数，方便外部使用
pub use fav::{
    client::{ClientConfig, FavoritesClient},
    error::ApiError,
    favorite::{
        ChatSurface, EmptyChatSurface, EmptyFavoritesListener, FavoriteItem, FavoriteRole,
        FavoritesListener, RelatedChat, SurfaceMessage,
    },
    host::{
        ChatNavigator, DialogHost, EmptyChatNavigator, EmptyDialogHost, EmptyHostContext,
        HostContext, TranscriptMessage,
    },
    popup::{EmptyPopupView, FavoriteCard, ListRender, PopupView, SidebarEntry},
    types::{FavoriteFilter, HostEvent, NoticeLevel},
};

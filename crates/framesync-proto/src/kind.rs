//! Window type categories reported by the host in `win_t`.

use serde::{Deserialize, Serialize};

/// Categorical window type
///
/// Only [`WindowKind::Normal`] windows get a local frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WindowKind {
    #[default]
    #[serde(rename = "WINDOW_TYPE_NORMAL")]
    Normal,
    #[serde(rename = "WINDOW_TYPE_DIALOG")]
    Dialog,
    #[serde(rename = "WINDOW_TYPE_DOCK")]
    Dock,
    #[serde(rename = "WINDOW_TYPE_DESKTOP")]
    Desktop,
    #[serde(rename = "WINDOW_TYPE_TOOLBAR")]
    Toolbar,
    #[serde(rename = "WINDOW_TYPE_MENU")]
    Menu,
    #[serde(rename = "WINDOW_TYPE_UTILITY")]
    Utility,
    #[serde(rename = "WINDOW_TYPE_SPLASH")]
    Splash,
    #[serde(rename = "WINDOW_TYPE_DROPDOWN_MENU")]
    DropdownMenu,
    #[serde(rename = "WINDOW_TYPE_POPUP_MENU")]
    PopupMenu,
    #[serde(rename = "WINDOW_TYPE_TOOLTIP")]
    Tooltip,
    #[serde(rename = "WINDOW_TYPE_NOTIFICATION")]
    Notification,
    #[serde(rename = "WINDOW_TYPE_COMBO")]
    Combo,
    #[serde(rename = "WINDOW_TYPE_DND")]
    Dnd,
    /// Any type this shell does not know about
    #[serde(other)]
    Other,
}

impl WindowKind {
    /// Whether windows of this kind get local chrome (frame, drag, resize)
    pub fn is_chromed(self) -> bool {
        matches!(self, WindowKind::Normal)
    }
}

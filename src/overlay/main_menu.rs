use super::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainMenuItem {
    EmulationSettings,
    LoadDiskImage,
    Resume,
}

impl MainMenuItem {
    pub const ALL: [MainMenuItem; 3] = [
        MainMenuItem::EmulationSettings,
        MainMenuItem::LoadDiskImage,
        MainMenuItem::Resume,
    ];

    pub fn title(self) -> &'static str {
        match self {
            MainMenuItem::EmulationSettings => "Emulation Settings...",
            MainMenuItem::LoadDiskImage => "Load Disk Image...",
            MainMenuItem::Resume => "Resume...",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainMenuAction {
    ShowSettings,
    ShowDisks,
    Dismiss,
}

/// Menu raised from the touch HUD, the Menu key or Back on an empty stack.
#[derive(Debug, Default)]
pub struct MainMenu {
    pub(super) surface: Surface,
}

impl MainMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &'static [MainMenuItem] {
        &MainMenuItem::ALL
    }

    /// Any row other than settings or disks resumes.
    pub fn select(&self, index: usize) -> MainMenuAction {
        match MainMenuItem::ALL.get(index) {
            Some(MainMenuItem::EmulationSettings) => MainMenuAction::ShowSettings,
            Some(MainMenuItem::LoadDiskImage) => MainMenuAction::ShowDisks,
            _ => MainMenuAction::Dismiss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_follows_item_order() {
        let menu = MainMenu::new();
        assert_eq!(menu.select(0), MainMenuAction::ShowSettings);
        assert_eq!(menu.select(1), MainMenuAction::ShowDisks);
        assert_eq!(menu.select(2), MainMenuAction::Dismiss);
        assert_eq!(menu.select(99), MainMenuAction::Dismiss);
        assert_eq!(menu.items()[0].title(), "Emulation Settings...");
    }
}

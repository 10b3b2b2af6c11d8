use super::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsItem {
    TouchMenuEnabled,
    TouchMenuVisibility,
    CurrentInput,
    KeyboardConfigure,
    JoystickConfigure,
    AudioConfigure,
    VideoConfigure,
    About,
    ResetPreferences,
}

impl SettingsItem {
    pub const ALL: [SettingsItem; 9] = [
        SettingsItem::TouchMenuEnabled,
        SettingsItem::TouchMenuVisibility,
        SettingsItem::CurrentInput,
        SettingsItem::KeyboardConfigure,
        SettingsItem::JoystickConfigure,
        SettingsItem::AudioConfigure,
        SettingsItem::VideoConfigure,
        SettingsItem::About,
        SettingsItem::ResetPreferences,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SettingsItem::TouchMenuEnabled => "Enable touch menu",
            SettingsItem::TouchMenuVisibility => "Touch menu visibility",
            SettingsItem::CurrentInput => "Current touch device",
            SettingsItem::KeyboardConfigure => "Configure keyboard",
            SettingsItem::JoystickConfigure => "Configure joystick",
            SettingsItem::AudioConfigure => "Configure audio",
            SettingsItem::VideoConfigure => "Configure video",
            SettingsItem::About => "About",
            SettingsItem::ResetPreferences => "Reset preferences",
        }
    }
}

/// Emulation settings list. Editing individual preferences is up to the host.
#[derive(Debug, Default)]
pub struct SettingsMenu {
    pub(super) surface: Surface,
}

impl SettingsMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &'static [SettingsItem] {
        &SettingsItem::ALL
    }

    pub fn select(&self, index: usize) -> Option<SettingsItem> {
        SettingsItem::ALL.get(index).copied()
    }
}

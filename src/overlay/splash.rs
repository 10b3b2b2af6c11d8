use super::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SplashButton {
    Start = 0,
    Settings = 1,
    Disks = 2,
}

impl From<i32> for SplashButton {
    fn from(value: i32) -> Self {
        match value {
            1 => SplashButton::Settings,
            2 => SplashButton::Disks,
            _ => SplashButton::Start,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplashAction {
    Dismiss,
    ShowSettings,
    ShowDisks,
    /// Buttons are disabled while the splash is not dismissable.
    Ignored,
}

/// First screen shown once graphics are ready.
#[derive(Debug)]
pub struct SplashScreen {
    pub(super) surface: Surface,
    dismissable: bool,
}

impl SplashScreen {
    pub fn new(dismissable: bool) -> Self {
        Self {
            surface: Surface::new(),
            dismissable,
        }
    }

    pub fn is_dismissable(&self) -> bool {
        self.dismissable
    }

    pub fn set_dismissable(&mut self, dismissable: bool) {
        self.dismissable = dismissable;
    }

    pub fn press(&self, button: SplashButton) -> SplashAction {
        if !self.dismissable {
            return SplashAction::Ignored;
        }
        match button {
            SplashButton::Start => SplashAction::Dismiss,
            SplashButton::Settings => SplashAction::ShowSettings,
            SplashButton::Disks => SplashAction::ShowDisks,
        }
    }
}

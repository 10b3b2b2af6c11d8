use super::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmKind {
    Quit,
    Reboot,
}

/// Yes/no prompt guarding a destructive engine action.
#[derive(Debug)]
pub struct ConfirmDialog {
    pub(super) surface: Surface,
    kind: ConfirmKind,
}

impl ConfirmDialog {
    pub fn new(kind: ConfirmKind) -> Self {
        Self {
            surface: Surface::new(),
            kind,
        }
    }

    pub fn kind(&self) -> ConfirmKind {
        self.kind
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            ConfirmKind::Quit => "Quit emulator?",
            ConfirmKind::Reboot => "Reboot emulator?",
        }
    }
}

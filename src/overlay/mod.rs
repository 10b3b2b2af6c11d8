//! Modal overlays and the stack that owns them.
//!
//! The variant set is closed: every overlay the front-end can show is a case
//! of [`Overlay`]. Each one carries a [`Surface`] that is attached while the
//! overlay sits on the stack and detached when it is popped.

mod confirm;
mod disks;
mod main_menu;
mod settings;
mod splash;
pub mod stack;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::SurfaceSize;

pub use confirm::{ConfirmDialog, ConfirmKind};
pub use disks::{is_disk_image, DisksMenu};
pub use main_menu::{MainMenu, MainMenuAction, MainMenuItem};
pub use settings::{SettingsItem, SettingsMenu};
pub use splash::{SplashAction, SplashButton, SplashScreen};
pub use stack::OverlayStackController;

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle the host uses to find the view backing an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Presentable surface of an overlay. `bounds` is set while it is shown.
#[derive(Debug)]
pub struct Surface {
    id: SurfaceId,
    bounds: Option<SurfaceSize>,
}

impl Surface {
    pub fn new() -> Self {
        Self {
            id: SurfaceId(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed)),
            bounds: None,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn bounds(&self) -> Option<SurfaceSize> {
        self.bounds
    }

    pub fn is_attached(&self) -> bool {
        self.bounds.is_some()
    }

    fn attach(&mut self, bounds: SurfaceSize) {
        self.bounds = Some(bounds);
    }

    fn detach(&mut self) {
        self.bounds = None;
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of an overlay on the stack. At most one overlay of each kind is
/// on the stack at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum OverlayKind {
    SplashScreen = 0,
    MainMenu = 1,
    SettingsMenu = 2,
    DisksMenu = 3,
    QuitConfirm = 4,
    RebootConfirm = 5,
}

#[derive(Debug)]
pub enum Overlay {
    SplashScreen(SplashScreen),
    MainMenu(MainMenu),
    SettingsMenu(SettingsMenu),
    DisksMenu(DisksMenu),
    Confirm(ConfirmDialog),
}

impl Overlay {
    pub fn kind(&self) -> OverlayKind {
        match self {
            Overlay::SplashScreen(_) => OverlayKind::SplashScreen,
            Overlay::MainMenu(_) => OverlayKind::MainMenu,
            Overlay::SettingsMenu(_) => OverlayKind::SettingsMenu,
            Overlay::DisksMenu(_) => OverlayKind::DisksMenu,
            Overlay::Confirm(dialog) => match dialog.kind() {
                ConfirmKind::Quit => OverlayKind::QuitConfirm,
                ConfirmKind::Reboot => OverlayKind::RebootConfirm,
            },
        }
    }

    pub fn surface(&self) -> &Surface {
        match self {
            Overlay::SplashScreen(o) => &o.surface,
            Overlay::MainMenu(o) => &o.surface,
            Overlay::SettingsMenu(o) => &o.surface,
            Overlay::DisksMenu(o) => &o.surface,
            Overlay::Confirm(o) => &o.surface,
        }
    }

    fn surface_mut(&mut self) -> &mut Surface {
        match self {
            Overlay::SplashScreen(o) => &mut o.surface,
            Overlay::MainMenu(o) => &mut o.surface,
            Overlay::SettingsMenu(o) => &mut o.surface,
            Overlay::DisksMenu(o) => &mut o.surface,
            Overlay::Confirm(o) => &mut o.surface,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.surface().is_attached()
    }

    /// Whether a user-initiated dismiss is honored.
    pub fn is_dismissable(&self) -> bool {
        match self {
            Overlay::SplashScreen(splash) => splash.is_dismissable(),
            _ => true,
        }
    }

    pub(crate) fn attach(&mut self, bounds: SurfaceSize) {
        self.surface_mut().attach(bounds);
    }

    pub(crate) fn detach(&mut self) {
        self.surface_mut().detach();
    }
}

impl From<SplashScreen> for Overlay {
    fn from(value: SplashScreen) -> Self {
        Overlay::SplashScreen(value)
    }
}

impl From<MainMenu> for Overlay {
    fn from(value: MainMenu) -> Self {
        Overlay::MainMenu(value)
    }
}

impl From<SettingsMenu> for Overlay {
    fn from(value: SettingsMenu) -> Self {
        Overlay::SettingsMenu(value)
    }
}

impl From<DisksMenu> for Overlay {
    fn from(value: DisksMenu) -> Self {
        Overlay::DisksMenu(value)
    }
}

impl From<ConfirmDialog> for Overlay {
    fn from(value: ConfirmDialog) -> Self {
        Overlay::Confirm(value)
    }
}

//! Process-wide gamepad enumeration entry point.
//!
//! A program under test that can be parameterized should take an
//! `Arc<dyn GamepadSource>` directly. For code that can only call a fixed
//! global, [`get_gamepads`] reads whichever source is currently installed;
//! until something is installed that is [`HostGamepads`].

use crate::device::GamepadSnapshot;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

pub const MAX_GAMEPADS: usize = 4;

/// One entry per slot; `None` where no device is connected.
pub type GamepadList = [Option<GamepadSnapshot>; MAX_GAMEPADS];

pub trait GamepadSource: Send + Sync {
    fn get_gamepads(&self) -> GamepadList;
}

/// Stand-in for physical hardware: nothing is ever connected.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostGamepads;

impl GamepadSource for HostGamepads {
    fn get_gamepads(&self) -> GamepadList {
        empty_list()
    }
}

pub fn empty_list() -> GamepadList {
    [None, None, None, None]
}

static ENTRY_POINT: LazyLock<RwLock<Arc<dyn GamepadSource>>> =
    LazyLock::new(|| RwLock::new(Arc::new(HostGamepads)));

/// Enumerates gamepads through the installed source. Always four slots.
pub fn get_gamepads() -> GamepadList {
    current().get_gamepads()
}

pub fn current() -> Arc<dyn GamepadSource> {
    ENTRY_POINT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Installs `source` as the entry point and hands back the one it replaced.
pub fn install(source: Arc<dyn GamepadSource>) -> Arc<dyn GamepadSource> {
    let mut slot = ENTRY_POINT
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *slot, source)
}

#[cfg(test)]
pub(crate) static TEST_ENTRY_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

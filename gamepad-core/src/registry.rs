//! Slot-indexed ownership of virtual gamepads, plus injection into the
//! process-wide enumeration entry point.

use crate::clock::{Clock, SystemClock};
use crate::device::{GamepadSnapshot, VirtualGamepad};
use crate::enumeration::{self, GamepadList, GamepadSource, MAX_GAMEPADS};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub struct GamepadRegistry {
    pads: [Option<VirtualGamepad>; MAX_GAMEPADS],
    clock: Arc<dyn Clock>,
}

impl GamepadRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            pads: std::array::from_fn(|_| None),
            clock,
        }
    }

    /// Creates a device at `slot`, replacing whatever was there. Returns `None`
    /// for slots outside `0..MAX_GAMEPADS`.
    pub fn create_device(
        &mut self,
        slot: usize,
        label: impl Into<String>,
    ) -> Option<&mut VirtualGamepad> {
        let entry = self.pads.get_mut(slot)?;
        *entry = Some(VirtualGamepad::new(slot, label, self.clock.clone()));
        entry.as_mut()
    }

    pub fn get_device(&self, slot: usize) -> Option<&VirtualGamepad> {
        self.pads.get(slot)?.as_ref()
    }

    pub fn get_device_mut(&mut self, slot: usize) -> Option<&mut VirtualGamepad> {
        self.pads.get_mut(slot)?.as_mut()
    }

    pub fn remove_device(&mut self, slot: usize) -> Option<VirtualGamepad> {
        self.pads.get_mut(slot)?.take()
    }

    pub fn set_button(&mut self, slot: usize, button: usize, pressed: bool) {
        if let Some(pad) = self.get_device_mut(slot) {
            pad.set_button(button, pressed);
        }
    }

    pub fn set_axis(&mut self, slot: usize, axis: usize, value: f64) {
        if let Some(pad) = self.get_device_mut(slot) {
            pad.set_axis(axis, value);
        }
    }

    pub fn reset_all(&mut self) {
        for pad in self.pads.iter_mut().flatten() {
            pad.reset();
        }
    }

    pub fn len(&self) -> usize {
        self.pads.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fixed four-slot view, `None` for empty slots.
    pub fn gamepads(&self) -> GamepadList {
        std::array::from_fn(|slot| self.pads[slot].as_ref().map(VirtualGamepad::snapshot))
    }
}

impl Default for GamepadRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GamepadRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GamepadRegistry")
            .field("pads", &self.pads)
            .finish_non_exhaustive()
    }
}

/// What gets installed into the entry point: a read-only view of the shared
/// registry, so the global never keeps the saved original alive.
struct RegistrySource(Arc<Mutex<GamepadRegistry>>);

impl GamepadSource for RegistrySource {
    fn get_gamepads(&self) -> GamepadList {
        lock(&self.0).gamepads()
    }
}

/// Cloneable handle to one registry, shared between the session loop, the
/// entry point and whoever reads snapshots.
#[derive(Clone)]
pub struct SharedRegistry {
    inner: Arc<Mutex<GamepadRegistry>>,
    saved: Arc<Mutex<Option<Arc<dyn GamepadSource>>>>,
}

impl SharedRegistry {
    pub fn new() -> Self {
        Self::from_registry(GamepadRegistry::new())
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::from_registry(GamepadRegistry::with_clock(clock))
    }

    pub fn from_registry(registry: GamepadRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
            saved: Arc::new(Mutex::new(None)),
        }
    }

    /// Runs `f` with the registry locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut GamepadRegistry) -> R) -> R {
        f(&mut lock(&self.inner))
    }

    pub fn create_device(&self, slot: usize, label: impl Into<String>) -> Option<GamepadSnapshot> {
        self.with(|registry| registry.create_device(slot, label).map(|pad| pad.snapshot()))
    }

    pub fn get_device(&self, slot: usize) -> Option<GamepadSnapshot> {
        self.with(|registry| registry.get_device(slot).map(VirtualGamepad::snapshot))
    }

    pub fn remove_device(&self, slot: usize) {
        self.with(|registry| {
            registry.remove_device(slot);
        });
    }

    pub fn set_button(&self, slot: usize, button: usize, pressed: bool) {
        self.with(|registry| registry.set_button(slot, button, pressed));
    }

    pub fn set_axis(&self, slot: usize, axis: usize, value: f64) {
        self.with(|registry| registry.set_axis(slot, axis, value));
    }

    pub fn reset_all(&self) {
        self.with(GamepadRegistry::reset_all);
    }

    pub fn gamepads(&self) -> GamepadList {
        self.with(|registry| registry.gamepads())
    }

    /// Saves the current entry point and installs this registry in its place.
    ///
    /// Calling this twice without [`restore`](Self::restore) in between
    /// overwrites the saved entry point with this registry, and the original
    /// can no longer be restored. Pair every call with one `restore`, or use
    /// [`inject_scoped`](Self::inject_scoped).
    pub fn inject(&self) {
        let source: Arc<dyn GamepadSource> = Arc::new(RegistrySource(self.inner.clone()));
        let previous = enumeration::install(source);
        *lock(&self.saved) = Some(previous);
    }

    /// Reinstalls the entry point saved by the last `inject`. No-op if nothing
    /// is saved.
    pub fn restore(&self) {
        if let Some(original) = lock(&self.saved).take() {
            enumeration::install(original);
        }
    }

    pub fn is_injected(&self) -> bool {
        lock(&self.saved).is_some()
    }

    /// Injects now and restores when the returned guard is dropped.
    pub fn inject_scoped(&self) -> InjectionGuard {
        self.inject();
        InjectionGuard {
            registry: self.clone(),
        }
    }
}

impl Default for SharedRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl GamepadSource for SharedRegistry {
    fn get_gamepads(&self) -> GamepadList {
        self.gamepads()
    }
}

impl fmt::Debug for SharedRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRegistry")
            .field("registry", &*lock(&self.inner))
            .field("injected", &self.is_injected())
            .finish()
    }
}

#[must_use = "dropping the guard restores the entry point immediately"]
pub struct InjectionGuard {
    registry: SharedRegistry,
}

impl InjectionGuard {
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }
}

impl Drop for InjectionGuard {
    fn drop(&mut self) {
        self.registry.restore();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

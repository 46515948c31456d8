pub mod clock;
pub mod device;
pub mod enumeration;
pub mod pulse;
pub mod registry;
pub mod rng;

pub use clock::{Clock, ManualClock, SystemClock};
pub use device::{ButtonState, GamepadSnapshot, VirtualGamepad, AXIS_COUNT, BUTTON_COUNT};
pub use enumeration::{GamepadList, GamepadSource, HostGamepads, MAX_GAMEPADS};
pub use pulse::{PendingRelease, PulseQueue};
pub use registry::{GamepadRegistry, InjectionGuard, SharedRegistry};
pub use rng::{RandomSource, SeededRng};

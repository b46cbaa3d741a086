use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// P1 bit 4 low selects the direction keys, bit 5 low the action buttons.
const SELECT_MASK: u8 = 0x30;
const SELECT_BUTTONS_HIGH: u8 = 0x10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Right,
    Left,
    Up,
    Down,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::Right,
        Button::Left,
        Button::Up,
        Button::Down,
    ];

    /// Position in [`JoypadState::buttons`]. The low nibble holds the action
    /// buttons in P1 order (start, select, B, A from bit 3 down), the high
    /// nibble the directions (down, up, left, right).
    const fn mask(self) -> u8 {
        match self {
            Button::A => 0x01,
            Button::B => 0x02,
            Button::Select => 0x04,
            Button::Start => 0x08,
            Button::Right => 0x10,
            Button::Left => 0x20,
            Button::Up => 0x40,
            Button::Down => 0x80,
        }
    }

    pub fn from_name(name: &str) -> Option<Button> {
        match name.to_ascii_lowercase().as_str() {
            "a" => Some(Button::A),
            "b" => Some(Button::B),
            "select" => Some(Button::Select),
            "start" => Some(Button::Start),
            "right" => Some(Button::Right),
            "left" => Some(Button::Left),
            "up" => Some(Button::Up),
            "down" => Some(Button::Down),
            _ => None,
        }
    }
}

/// A single press or release delivered by an input collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub button: Button,
    pub pressed: bool,
}

impl ButtonEvent {
    pub fn press(button: Button) -> Self {
        Self {
            button,
            pressed: true,
        }
    }

    pub fn release(button: Button) -> Self {
        Self {
            button,
            pressed: false,
        }
    }
}

/// Latest known button state. A set bit means the button is released,
/// matching the active-low P1 register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoypadState {
    pub buttons: u8,
}

impl Default for JoypadState {
    fn default() -> Self {
        Self { buttons: 0xFF }
    }
}

impl JoypadState {
    pub fn is_pressed(&self, button: Button) -> bool {
        self.buttons & button.mask() == 0
    }

    pub fn set(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.buttons &= !button.mask();
        } else {
            self.buttons |= button.mask();
        }
    }
}

/// Cloneable handle to the shared button state. Input threads write through
/// it, the bus reads through it when P1 is accessed.
#[derive(Debug, Clone, Default)]
pub struct JoypadHandle {
    state: Arc<Mutex<JoypadState>>,
}

impl JoypadHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, JoypadState> {
        // A panicking writer cannot leave a u8 half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, button: Button, pressed: bool) {
        self.lock().set(button, pressed);
    }

    pub fn apply(&self, event: ButtonEvent) {
        self.set(event.button, event.pressed);
    }

    pub fn release_all(&self) {
        *self.lock() = JoypadState::default();
    }

    pub fn snapshot(&self) -> JoypadState {
        *self.lock()
    }
}

/// The P1 register as seen from the bus.
#[derive(Debug)]
pub struct Joypad {
    select: u8,
    handle: JoypadHandle,
}

impl Joypad {
    pub fn new(handle: JoypadHandle) -> Self {
        Self {
            select: SELECT_MASK,
            handle,
        }
    }

    pub fn handle(&self) -> JoypadHandle {
        self.handle.clone()
    }

    pub fn write(&mut self, val: u8) {
        self.select = val & SELECT_MASK;
    }

    pub fn read(&self) -> u8 {
        if self.select == SELECT_MASK {
            return 0x3F;
        }
        let buttons = self.handle.snapshot().buttons;
        let nibble = if self.select & SELECT_BUTTONS_HIGH != 0 {
            buttons & 0x0F
        } else {
            buttons >> 4
        };
        self.select | nibble
    }
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new(JoypadHandle::new())
    }
}

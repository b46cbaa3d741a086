/// Interrupt sources in service priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    VBlank,
    Stat,
    Timer,
    Serial,
    Joypad,
}

/// Only the low five bits of IF/IE are wired.
pub const INTERRUPT_MASK: u8 = 0x1F;

impl Interrupt {
    pub const ALL: [Interrupt; 5] = [
        Interrupt::VBlank,
        Interrupt::Stat,
        Interrupt::Timer,
        Interrupt::Serial,
        Interrupt::Joypad,
    ];

    /// Bit in IF/IE.
    pub const fn bit(self) -> u8 {
        match self {
            Interrupt::VBlank => 0x01,
            Interrupt::Stat => 0x02,
            Interrupt::Timer => 0x04,
            Interrupt::Serial => 0x08,
            Interrupt::Joypad => 0x10,
        }
    }

    // Interrupt vectors (gbdev.io/pandocs/Interrupts.html)
    pub const fn vector(self) -> u16 {
        match self {
            Interrupt::VBlank => 0x40,
            Interrupt::Stat => 0x48,
            Interrupt::Timer => 0x50,
            Interrupt::Serial => 0x58,
            Interrupt::Joypad => 0x60,
        }
    }

    /// Highest-priority source that is both requested and enabled.
    pub fn next_pending(if_reg: u8, ie_reg: u8) -> Option<Interrupt> {
        let pending = if_reg & ie_reg & INTERRUPT_MASK;
        Self::ALL.into_iter().find(|irq| pending & irq.bit() != 0)
    }
}

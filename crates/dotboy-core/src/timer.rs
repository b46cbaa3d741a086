use crate::interrupt::Interrupt;

/// DIV ticks once every 64 M-cycles (256 T-cycles).
const DIV_PERIOD: u32 = 64;

const TAC_ENABLE: u8 = 0x04;
const TAC_CLOCK_SELECT: u8 = 0x03;

/// M-cycles per TIMA increment for each TAC clock select value.
const TAC_DIVIDERS: [u32; 4] = [256, 4, 16, 64];

pub struct Timer {
    /// Divider register, incremented when the sub-counter wraps.
    pub div: u8,
    /// Timer counter
    pub tima: u8,
    /// Timer modulo
    pub tma: u8,
    /// Timer control
    pub tac: u8,
    /// Free-running sub-counter feeding DIV
    div_counter: u32,
    /// Cycles accumulated toward the next TIMA increment
    tac_counter: u32,
    /// Current divisor derived from TAC
    divider: u32,
    enabled: bool,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            div: 0,
            tima: 0,
            tma: 0,
            tac: 0,
            div_counter: 0,
            tac_counter: 0,
            divider: TAC_DIVIDERS[0],
            enabled: false,
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF04 => self.div,
            0xFF05 => self.tima,
            0xFF06 => self.tma,
            0xFF07 => self.tac | 0xF8,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF04 => self.reset_div(),
            0xFF05 => self.tima = val,
            0xFF06 => self.tma = val,
            0xFF07 => {
                self.tac = val & 0x07;
                self.enabled = self.tac & TAC_ENABLE != 0;
                self.divider = TAC_DIVIDERS[(self.tac & TAC_CLOCK_SELECT) as usize];
            }
            _ => {}
        }
    }

    /// Advance the timer by `cycles` M-cycles, requesting the timer interrupt
    /// in `if_reg` whenever TIMA overflows.
    pub fn advance(&mut self, cycles: u32, if_reg: &mut u8) {
        let div_total = self.div_counter + cycles;
        self.div = self.div.wrapping_add((div_total / DIV_PERIOD) as u8);
        self.div_counter = div_total % DIV_PERIOD;

        if !self.enabled {
            return;
        }

        let tac_total = self.tac_counter + cycles;
        let ticks = tac_total / self.divider;
        self.tac_counter = tac_total % self.divider;
        for _ in 0..ticks {
            self.increment(if_reg);
        }
    }

    /// Reset the divider and its sub-counter, as a write to DIV does.
    pub fn reset_div(&mut self) {
        self.div = 0;
        self.div_counter = 0;
    }

    fn increment(&mut self, if_reg: &mut u8) {
        let (next, overflow) = self.tima.overflowing_add(1);
        if overflow {
            self.tima = self.tma;
            *if_reg |= Interrupt::Timer.bit();
        } else {
            self.tima = next;
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

// CPU flag bits as documented in gbdev.io/pandocs/The_CPU_Flags.html
pub const FLAG_Z: u8 = 0x80; // Zero
pub const FLAG_N: u8 = 0x40; // Subtract
pub const FLAG_H: u8 = 0x20; // Half Carry
pub const FLAG_C: u8 = 0x10; // Carry

/// Bits 0-3 of F do not exist in hardware and always read back as zero.
const FLAG_MASK: u8 = 0xF0;

/// The SM83 register file. Pairs are formed high byte first: `B:C`, `D:E`,
/// `H:L` and `A:F`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
}

impl Registers {
    /// Register state left behind by the DMG boot ROM
    /// (gbdev.io/pandocs/Power_Up_State.html).
    pub fn post_boot() -> Self {
        let mut regs = Self::default();
        regs.set_af(0x01B0);
        regs.set_bc(0x0013);
        regs.set_de(0x00D8);
        regs.set_hl(0x014D);
        regs.sp = 0xFFFE;
        regs.pc = 0x0100;
        regs
    }

    #[inline]
    pub fn f(&self) -> u8 {
        self.f
    }

    #[inline]
    pub fn set_f(&mut self, val: u8) {
        self.f = val & FLAG_MASK;
    }

    #[inline]
    pub fn flag(&self, mask: u8) -> bool {
        self.f & mask != 0
    }

    pub fn af(&self) -> u16 {
        ((self.a as u16) << 8) | self.f as u16
    }

    pub fn set_af(&mut self, val: u16) {
        self.a = (val >> 8) as u8;
        self.set_f(val as u8);
    }

    pub fn bc(&self) -> u16 {
        ((self.b as u16) << 8) | self.c as u16
    }

    pub fn set_bc(&mut self, val: u16) {
        self.b = (val >> 8) as u8;
        self.c = val as u8;
    }

    pub fn de(&self) -> u16 {
        ((self.d as u16) << 8) | self.e as u16
    }

    pub fn set_de(&mut self, val: u16) {
        self.d = (val >> 8) as u8;
        self.e = val as u8;
    }

    pub fn hl(&self) -> u16 {
        ((self.h as u16) << 8) | self.l as u16
    }

    pub fn set_hl(&mut self, val: u16) {
        self.h = (val >> 8) as u8;
        self.l = val as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_split_high_byte_first() {
        let mut regs = Registers::default();
        for val in [0x0000u16, 0x00FF, 0xFF00, 0x1234, 0xBEEF, 0xFFFF] {
            regs.set_bc(val);
            assert_eq!((regs.b, regs.c), ((val >> 8) as u8, val as u8));
            assert_eq!(regs.bc(), val);

            regs.set_de(val);
            assert_eq!((regs.d, regs.e), ((val >> 8) as u8, val as u8));
            assert_eq!(regs.de(), val);

            regs.set_hl(val);
            assert_eq!((regs.h, regs.l), ((val >> 8) as u8, val as u8));
            assert_eq!(regs.hl(), val);
        }
    }

    #[test]
    fn halves_compose_into_pairs() {
        let mut regs = Registers::default();
        for hi in (0..=0xFFu16).step_by(17) {
            for lo in (0..=0xFFu16).step_by(13) {
                regs.h = hi as u8;
                regs.l = lo as u8;
                assert_eq!(regs.hl(), (hi << 8) | lo);
                regs.b = lo as u8;
                regs.c = hi as u8;
                assert_eq!(regs.bc(), (lo << 8) | hi);
            }
        }
    }

    #[test]
    fn af_keeps_low_nibble_of_f_clear() {
        let mut regs = Registers::default();
        for val in 0..=0xFFFFu16 {
            regs.set_af(val);
            assert_eq!(regs.a, (val >> 8) as u8);
            assert_eq!(regs.f() & 0x0F, 0);
            assert_eq!(regs.af(), val & 0xFFF0);
        }
        regs.set_f(0xFF);
        assert_eq!(regs.f(), 0xF0);
    }

    #[test]
    fn post_boot_matches_dmg_hand_off() {
        let regs = Registers::post_boot();
        assert_eq!(regs.af(), 0x01B0);
        assert_eq!(regs.bc(), 0x0013);
        assert_eq!(regs.de(), 0x00D8);
        assert_eq!(regs.hl(), 0x014D);
        assert_eq!(regs.sp, 0xFFFE);
        assert_eq!(regs.pc, 0x0100);
    }
}

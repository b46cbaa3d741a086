use log::{debug, info};

use crate::{
    cartridge::Cartridge,
    interrupt::INTERRUPT_MASK,
    joypad::{Joypad, JoypadHandle},
    ppu::Ppu,
    timer::Timer,
};

const WRAM_SIZE: usize = 0x2000;
const HRAM_SIZE: usize = 0x7F;
const IO_SIZE: usize = 0x80;

/// Bytes copied by one OAM DMA transfer.
const DMA_LEN: u16 = 0xA0;

/// The memory bus. Every address decodes to exactly one backing store.
pub struct Mmu {
    pub cart: Option<Cartridge>,
    pub ppu: Ppu,
    pub timer: Timer,
    pub joypad: Joypad,
    pub if_reg: u8,
    pub ie_reg: u8,
    wram: [u8; WRAM_SIZE],
    hram: [u8; HRAM_SIZE],
    /// I/O addresses no component claims
    io: [u8; IO_SIZE],
    boot_rom: Option<Vec<u8>>,
    boot_rom_disabled: bool,
}

impl Mmu {
    /// Bus state after the boot ROM has run.
    pub fn new() -> Self {
        Self {
            ppu: Ppu::new(),
            boot_rom_disabled: true,
            ..Self::new_power_on()
        }
    }

    /// Bus state at power-on with the LCD off and the boot ROM still mapped.
    pub fn new_power_on() -> Self {
        Self {
            cart: None,
            ppu: Ppu::new_power_on(),
            timer: Timer::new(),
            joypad: Joypad::default(),
            if_reg: 0,
            ie_reg: 0,
            wram: [0; WRAM_SIZE],
            hram: [0; HRAM_SIZE],
            io: [0; IO_SIZE],
            boot_rom: None,
            boot_rom_disabled: false,
        }
    }

    pub fn load_cart(&mut self, mut cart: Cartridge) {
        if let Some(boot) = self.boot_rom.as_deref() {
            if !self.boot_rom_disabled {
                cart.map_boot_rom(boot);
            }
        }
        self.cart = Some(cart);
    }

    pub fn load_boot_rom(&mut self, data: Vec<u8>) {
        if !self.boot_rom_disabled {
            if let Some(cart) = self.cart.as_mut() {
                cart.map_boot_rom(&data);
            }
        }
        self.boot_rom = Some(data);
    }

    pub fn take_boot_rom(&mut self) -> Option<Vec<u8>> {
        self.boot_rom.take()
    }

    pub fn boot_rom_disabled(&self) -> bool {
        self.boot_rom_disabled
    }

    /// Handle for feeding button state from another thread.
    pub fn joypad_handle(&self) -> JoypadHandle {
        self.joypad.handle()
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7FFF | 0xA000..=0xBFFF => match &self.cart {
                Some(cart) => cart.read(addr),
                None => 0xFF,
            },
            0x8000..=0x9FFF => self.ppu.read_vram(addr),
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize],
            0xE000..=0xFDFF => self.wram[(addr - 0xE000) as usize],
            0xFE00..=0xFE9F => self.ppu.read_oam(addr),
            0xFEA0..=0xFEFF => {
                debug!("Read from unusable memory {addr:04X}");
                0
            }
            0xFF00 => self.joypad.read(),
            0xFF04..=0xFF07 => self.timer.read(addr),
            0xFF0F => self.if_reg | 0xE0,
            0xFF40..=0xFF4B => self.ppu.read_reg(addr),
            0xFF50 => 0xFF,
            0xFF01..=0xFF7F => self.io[(addr - 0xFF00) as usize],
            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize],
            0xFFFF => self.ie_reg,
        }
    }

    pub fn write_byte(&mut self, addr: u16, val: u8) {
        match addr {
            0x0000..=0x7FFF | 0xA000..=0xBFFF => {
                if let Some(cart) = self.cart.as_mut() {
                    cart.write(addr, val);
                }
            }
            0x8000..=0x9FFF => self.ppu.write_vram(addr, val),
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize] = val,
            0xE000..=0xFDFF => self.wram[(addr - 0xE000) as usize] = val,
            0xFE00..=0xFE9F => self.ppu.write_oam(addr, val),
            0xFEA0..=0xFEFF => debug!("Ignored write {val:02X} to unusable memory {addr:04X}"),
            0xFF00 => self.joypad.write(val),
            0xFF04..=0xFF07 => self.timer.write(addr, val),
            0xFF0F => self.if_reg = val & INTERRUPT_MASK,
            0xFF46 => {
                self.ppu.write_reg(addr, val, &mut self.if_reg);
                self.oam_dma(val);
            }
            0xFF40..=0xFF4B => self.ppu.write_reg(addr, val, &mut self.if_reg),
            0xFF50 => {
                if val != 0 && !self.boot_rom_disabled {
                    self.boot_rom_disabled = true;
                    if let Some(cart) = self.cart.as_mut() {
                        cart.unmap_boot_rom();
                    }
                    info!("Boot ROM unmapped");
                }
            }
            0xFF01..=0xFF7F => self.io[(addr - 0xFF00) as usize] = val,
            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize] = val,
            0xFFFF => self.ie_reg = val,
        }
    }

    /// Copy 160 bytes from `page << 8` into OAM through the bus.
    fn oam_dma(&mut self, page: u8) {
        let src = (page as u16) << 8;
        for i in 0..DMA_LEN {
            let byte = self.read_byte(src.wrapping_add(i));
            self.write_byte(0xFE00 + i, byte);
        }
    }

    pub fn read_word(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read_byte(addr), self.read_byte(addr.wrapping_add(1))])
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}

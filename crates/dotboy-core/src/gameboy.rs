use crate::{
    cartridge::Cartridge,
    cpu::Cpu,
    joypad::{ButtonEvent, Joypad, JoypadHandle},
    mmu::Mmu,
};

/// Receives each completed frame as `0x00RRGGBB` pixels, row-major.
pub trait FrameSink {
    fn present(&mut self, frame: &[u32], frame_count: u64);
}

/// Source of button transitions. Events are dropped while the frontend does
/// not have focus.
pub trait InputProvider {
    fn has_focus(&self) -> bool {
        true
    }

    fn poll(&mut self) -> Option<ButtonEvent>;
}

/// Called once per completed frame. Throttling, if any, happens here.
pub trait FramePacer {
    fn frame_completed(&mut self, frame_count: u64);
}

pub struct GameBoy {
    pub cpu: Cpu,
    pub mmu: Mmu,
    power_on: bool,
}

impl GameBoy {
    /// Machine in the state the boot ROM leaves behind.
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            mmu: Mmu::new(),
            power_on: false,
        }
    }

    /// Create a Game Boy initialized to an approximate power-on state suitable
    /// for executing a boot ROM.
    pub fn new_power_on() -> Self {
        Self {
            cpu: Cpu::new_power_on(),
            mmu: Mmu::new_power_on(),
            power_on: true,
        }
    }

    pub fn load_cart(&mut self, cart: Cartridge) {
        self.mmu.load_cart(cart);
    }

    pub fn load_boot_rom(&mut self, data: Vec<u8>) {
        self.mmu.load_boot_rom(data);
    }

    /// Reset to the initial state while preserving the loaded cartridge,
    /// its RAM and the boot ROM.
    pub fn reset(&mut self) {
        let cart = self.mmu.cart.take();
        let boot = self.mmu.take_boot_rom();
        let joypad = self.mmu.joypad_handle();
        *self = if self.power_on {
            Self::new_power_on()
        } else {
            Self::new()
        };
        self.mmu.joypad = Joypad::new(joypad);
        if let Some(b) = boot {
            self.mmu.load_boot_rom(b);
        }
        if let Some(mut c) = cart {
            c.reset();
            self.mmu.load_cart(c);
        }
    }

    pub fn joypad_handle(&self) -> JoypadHandle {
        self.mmu.joypad_handle()
    }

    pub fn frame_count(&self) -> u64 {
        self.mmu.ppu.frames()
    }

    /// Run one CPU step and advance the PPU by the cycles it took.
    pub fn step(&mut self) -> u32 {
        let cycles = self.cpu.step(&mut self.mmu);
        self.mmu.ppu.advance(cycles, &mut self.mmu.if_reg);
        cycles
    }

    /// Drain pending input. Events that arrive without focus are discarded.
    pub fn pump_input(&mut self, input: &mut dyn InputProvider) {
        let focused = input.has_focus();
        let handle = self.mmu.joypad_handle();
        while let Some(event) = input.poll() {
            if focused {
                handle.apply(event);
            }
        }
    }

    /// Step until the PPU completes a frame, hand it to `sink` and notify
    /// `pacer`. Returns the M-cycles spent.
    ///
    /// With the LCD switched off no frame ever completes, so the call gives up
    /// after two frames' worth of cycles.
    pub fn run_frame(
        &mut self,
        sink: &mut dyn FrameSink,
        input: &mut dyn InputProvider,
        pacer: &mut dyn FramePacer,
    ) -> u32 {
        const FRAME_CYCLES: u32 = 17_520;

        let mut total = 0u32;
        while !self.mmu.ppu.frame_ready() && total < FRAME_CYCLES * 2 {
            self.pump_input(input);
            total += self.step();
        }
        if self.mmu.ppu.frame_ready() {
            self.mmu.ppu.clear_frame_flag();
            let frame_count = self.mmu.ppu.frames();
            sink.present(self.mmu.ppu.framebuffer(), frame_count);
            pacer.frame_completed(frame_count);
        }
        total
    }
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}

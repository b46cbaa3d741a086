use crate::interrupt::Interrupt;

#[cfg(feature = "ppu-trace")]
use log::trace;

// Screen resolution used by the Game Boy PPU
pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

// Dots spent in each mode. One CPU M-cycle is four dots.
const DOTS_PER_CYCLE: u32 = 4;
const DOTS_OAM: i32 = 80;
const DOTS_DRAW: i32 = 230;
const DOTS_HBLANK: i32 = 145;
const DOTS_VBLANK_LINE: u32 = 456;
const VBLANK_LINES: u8 = 10;
const DOTS_VBLANK: i32 = DOTS_VBLANK_LINE as i32 * VBLANK_LINES as i32;

const LAST_LINE: u8 = SCREEN_HEIGHT as u8 + VBLANK_LINES - 1;

// Sprite limits
const MAX_SPRITES_PER_LINE: usize = 10;
const TOTAL_SPRITES: usize = 40;

// Internal memory sizes
const VRAM_SIZE: usize = 0x2000;
const OAM_SIZE: usize = TOTAL_SPRITES * 4;

/// Sprites are indexed by `y >> 4`.
const OAM_HASH_BUCKETS: usize = 16;

// VRAM layout constants
const BG_MAP_0_BASE: usize = 0x1800;
const BG_MAP_1_BASE: usize = 0x1C00;
const SIGNED_TILE_BASE: usize = 0x1000;

// Window X position is clipped if greater than this value
const WINDOW_X_MAX: u8 = 166;
const WINDOW_Y_MAX: u8 = 143;

// LCDC bits
const LCDC_BG_ENABLE: u8 = 0x01;
const LCDC_OBJ_ENABLE: u8 = 0x02;
const LCDC_OBJ_TALL: u8 = 0x04;
const LCDC_BG_MAP: u8 = 0x08;
const LCDC_UNSIGNED_TILES: u8 = 0x10;
const LCDC_WINDOW_ENABLE: u8 = 0x20;
const LCDC_WINDOW_MAP: u8 = 0x40;
const LCDC_ENABLE: u8 = 0x80;

// STAT bits
const STAT_MODE_MASK: u8 = 0x03;
const STAT_LYC_FLAG: u8 = 0x04;
const STAT_HBLANK_IRQ: u8 = 0x08;
const STAT_VBLANK_IRQ: u8 = 0x10;
const STAT_OAM_IRQ: u8 = 0x20;
const STAT_LYC_IRQ: u8 = 0x40;
const STAT_WRITABLE: u8 = 0x78;

// Sprite attribute bits
const OBJ_BEHIND_BG: u8 = 0x80;
const OBJ_FLIP_Y: u8 = 0x40;
const OBJ_FLIP_X: u8 = 0x20;
const OBJ_PALETTE_1: u8 = 0x10;

/// DMG shades in 0x00RRGGBB order, lightest first.
pub const DMG_PALETTE: [u32; 4] = [0x00E8FCCC, 0x00ACD490, 0x00548C70, 0x00142C38];

/// LCD modes as reported in STAT bits 0-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamScan = 2,
    Draw = 3,
}

#[derive(Copy, Clone, Default)]
struct Sprite {
    x: u8,
    y: u8,
    tile: u8,
    flags: u8,
    oam_index: u8,
}

pub struct Ppu {
    pub vram: [u8; VRAM_SIZE],
    oam: [u8; OAM_SIZE],

    lcdc: u8,
    stat: u8,
    scy: u8,
    scx: u8,
    ly: u8,
    lyc: u8,
    pub dma: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,

    mode: Mode,
    dots_remaining: i32,
    /// Dots spent in the current v-blank line
    vblank_dots: u32,

    framebuffer: [u32; SCREEN_WIDTH * SCREEN_HEIGHT],
    /// Sprite numbers grouped by the high nibble of their Y byte
    oam_hash: [Vec<u8>; OAM_HASH_BUCKETS],
    /// Indicates a completed frame is available in `framebuffer`
    frame_ready: bool,
    frame_count: u64,
}

impl Ppu {
    /// PPU state after the boot ROM has handed over: LCD on, OAM scan of line 0.
    pub fn new() -> Self {
        let mut ppu = Self::new_power_on();
        ppu.lcdc = 0x91;
        ppu.bgp = 0xFC;
        ppu.reset_lcd();
        ppu.stat |= STAT_LYC_FLAG;
        ppu
    }

    /// PPU with the LCD switched off, as seen by a boot ROM.
    pub fn new_power_on() -> Self {
        Self {
            vram: [0; VRAM_SIZE],
            oam: [0; OAM_SIZE],
            lcdc: 0,
            stat: 0,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            dma: 0,
            bgp: 0,
            obp0: 0,
            obp1: 0,
            wy: 0,
            wx: 0,
            mode: Mode::HBlank,
            dots_remaining: DOTS_OAM,
            vblank_dots: 0,
            framebuffer: [DMG_PALETTE[0]; SCREEN_WIDTH * SCREEN_HEIGHT],
            // Zeroed OAM puts every sprite in the first bucket.
            oam_hash: std::array::from_fn(|bucket| {
                if bucket == 0 {
                    (0..TOTAL_SPRITES as u8).collect()
                } else {
                    Vec::with_capacity(TOTAL_SPRITES)
                }
            }),
            frame_ready: false,
            frame_count: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn ly(&self) -> u8 {
        self.ly
    }

    pub fn dots_remaining(&self) -> i32 {
        self.dots_remaining
    }

    pub fn lcd_enabled(&self) -> bool {
        self.lcdc & LCDC_ENABLE != 0
    }

    pub fn frame_ready(&self) -> bool {
        self.frame_ready
    }

    pub fn framebuffer(&self) -> &[u32; SCREEN_WIDTH * SCREEN_HEIGHT] {
        &self.framebuffer
    }

    pub fn clear_frame_flag(&mut self) {
        self.frame_ready = false;
    }

    /// Number of frames completed so far. External pacing hangs off this.
    pub fn frames(&self) -> u64 {
        self.frame_count
    }

    pub fn read_vram(&self, addr: u16) -> u8 {
        self.vram[(addr as usize - 0x8000) & (VRAM_SIZE - 1)]
    }

    pub fn write_vram(&mut self, addr: u16, val: u8) {
        self.vram[(addr as usize - 0x8000) & (VRAM_SIZE - 1)] = val;
    }

    pub fn read_oam(&self, addr: u16) -> u8 {
        self.oam
            .get(addr as usize - 0xFE00)
            .copied()
            .unwrap_or(0)
    }

    pub fn write_oam(&mut self, addr: u16, val: u8) {
        let offset = addr as usize - 0xFE00;
        if offset >= OAM_SIZE {
            return;
        }
        if offset % 4 == 0 {
            self.rehash_sprite(offset / 4, val);
        }
        self.oam[offset] = val;
    }

    /// Move a sprite to the bucket of its new Y byte before the byte changes.
    fn rehash_sprite(&mut self, sprite: usize, new_y: u8) {
        let old_bucket = (self.oam[sprite * 4] >> 4) as usize;
        let new_bucket = (new_y >> 4) as usize;
        if old_bucket == new_bucket {
            return;
        }
        let id = sprite as u8;
        self.oam_hash[old_bucket].retain(|&s| s != id);
        self.oam_hash[new_bucket].push(id);
    }

    pub fn read_reg(&self, addr: u16) -> u8 {
        match addr {
            0xFF40 => self.lcdc,
            0xFF41 => self.stat | 0x80,
            0xFF42 => self.scy,
            0xFF43 => self.scx,
            0xFF44 => self.ly,
            0xFF45 => self.lyc,
            0xFF46 => self.dma,
            0xFF47 => self.bgp,
            0xFF48 => self.obp0,
            0xFF49 => self.obp1,
            0xFF4A => self.wy,
            0xFF4B => self.wx,
            _ => 0xFF,
        }
    }

    /// Write a register other than DMA, which the bus performs itself.
    pub fn write_reg(&mut self, addr: u16, val: u8, if_reg: &mut u8) {
        match addr {
            0xFF40 => {
                let toggled = (self.lcdc ^ val) & LCDC_ENABLE != 0;
                self.lcdc = val;
                if toggled {
                    if val & LCDC_ENABLE != 0 {
                        self.reset_lcd();
                    } else {
                        self.ly = 0;
                        self.dots_remaining = DOTS_OAM;
                        self.set_mode(Mode::HBlank);
                    }
                    self.compare_lyc(if_reg);
                }
            }
            0xFF41 => self.stat = (self.stat & !STAT_WRITABLE) | (val & STAT_WRITABLE),
            0xFF42 => self.scy = val,
            0xFF43 => self.scx = val,
            0xFF44 => {}
            0xFF45 => {
                self.lyc = val;
                self.compare_lyc(if_reg);
            }
            0xFF46 => self.dma = val,
            0xFF47 => self.bgp = val,
            0xFF48 => self.obp0 = val,
            0xFF49 => self.obp1 = val,
            0xFF4A => self.wy = val,
            0xFF4B => self.wx = val,
            _ => {}
        }
    }

    fn reset_lcd(&mut self) {
        self.ly = 0;
        self.vblank_dots = 0;
        self.dots_remaining = DOTS_OAM;
        self.set_mode(Mode::OamScan);
    }

    fn set_mode(&mut self, mode: Mode) {
        #[cfg(feature = "ppu-trace")]
        trace!("PPU mode {:?} -> {mode:?} at LY={}", self.mode, self.ly);
        self.mode = mode;
        self.stat = (self.stat & !STAT_MODE_MASK) | mode as u8;
    }

    fn set_ly(&mut self, ly: u8, if_reg: &mut u8) {
        self.ly = ly;
        self.compare_lyc(if_reg);
    }

    /// Refresh the coincidence flag; the interrupt fires only on the edge into
    /// equality.
    fn compare_lyc(&mut self, if_reg: &mut u8) {
        let equal = self.ly == self.lyc;
        let was_equal = self.stat & STAT_LYC_FLAG != 0;
        if equal {
            self.stat |= STAT_LYC_FLAG;
            if !was_equal && self.stat & STAT_LYC_IRQ != 0 {
                *if_reg |= Interrupt::Stat.bit();
            }
        } else {
            self.stat &= !STAT_LYC_FLAG;
        }
    }

    fn request_stat(&self, enable_bit: u8, if_reg: &mut u8) {
        if self.stat & enable_bit != 0 {
            *if_reg |= Interrupt::Stat.bit();
        }
    }

    /// Advance by `cycles` M-cycles. Returns true when v-blank was entered.
    pub fn advance(&mut self, cycles: u32, if_reg: &mut u8) -> bool {
        if self.lcdc & LCDC_ENABLE == 0 {
            return false;
        }

        let mut entered_vblank = false;
        let mut dots = cycles * DOTS_PER_CYCLE;
        while dots > 0 {
            let chunk = dots.min(self.dots_remaining.max(1) as u32);
            dots -= chunk;
            self.dots_remaining -= chunk as i32;

            if self.mode == Mode::VBlank {
                self.vblank_dots += chunk;
                while self.vblank_dots >= DOTS_VBLANK_LINE {
                    self.vblank_dots -= DOTS_VBLANK_LINE;
                    if self.ly < LAST_LINE {
                        self.set_ly(self.ly + 1, if_reg);
                    }
                }
            }

            if self.dots_remaining <= 0 {
                entered_vblank |= self.change_mode(if_reg);
            }
        }
        entered_vblank
    }

    fn change_mode(&mut self, if_reg: &mut u8) -> bool {
        match self.mode {
            Mode::OamScan => {
                self.dots_remaining += DOTS_DRAW;
                self.set_mode(Mode::Draw);
            }
            Mode::Draw => {
                self.dots_remaining += DOTS_HBLANK;
                self.set_mode(Mode::HBlank);
                self.render_scanline();
                self.request_stat(STAT_HBLANK_IRQ, if_reg);
            }
            Mode::HBlank => {
                self.set_ly(self.ly.wrapping_add(1), if_reg);
                if self.ly as usize >= SCREEN_HEIGHT {
                    self.vblank_dots = 0;
                    self.dots_remaining += DOTS_VBLANK;
                    self.set_mode(Mode::VBlank);
                    self.request_stat(STAT_VBLANK_IRQ, if_reg);
                    *if_reg |= Interrupt::VBlank.bit();
                    self.frame_count += 1;
                    self.frame_ready = true;
                    return true;
                }
                self.dots_remaining += DOTS_OAM;
                self.set_mode(Mode::OamScan);
                self.request_stat(STAT_OAM_IRQ, if_reg);
            }
            Mode::VBlank => {
                self.dots_remaining += DOTS_OAM;
                self.vblank_dots = 0;
                self.set_ly(0, if_reg);
                self.set_mode(Mode::OamScan);
                self.request_stat(STAT_OAM_IRQ, if_reg);
            }
        }
        false
    }

    fn sprite_height(&self) -> u8 {
        if self.lcdc & LCDC_OBJ_TALL != 0 { 16 } else { 8 }
    }

    /// Sprites covering the current line, in bucket scan order.
    fn line_sprites(&self, out: &mut [Sprite; MAX_SPRITES_PER_LINE]) -> usize {
        let height = self.sprite_height() as u16;
        let line = self.ly as u16 + 16;
        let first = (self.ly >> 4) as usize;
        let mut count = 0;
        for bucket in first..(first + 2).min(OAM_HASH_BUCKETS) {
            for &id in &self.oam_hash[bucket] {
                if count == MAX_SPRITES_PER_LINE {
                    return count;
                }
                let base = id as usize * 4;
                let y = self.oam[base] as u16;
                if y <= line && line - y < height {
                    out[count] = Sprite {
                        y: self.oam[base],
                        x: self.oam[base + 1],
                        tile: self.oam[base + 2],
                        flags: self.oam[base + 3],
                        oam_index: id,
                    };
                    count += 1;
                }
            }
        }
        count
    }

    fn tile_data_addr(&self, tile: u8) -> usize {
        if self.lcdc & LCDC_UNSIGNED_TILES != 0 {
            tile as usize * 16
        } else {
            (SIGNED_TILE_BASE as isize + tile as i8 as isize * 16) as usize
        }
    }

    fn tile_pixel(&self, addr: usize, bit: u8) -> u8 {
        let lo = self.vram[addr & (VRAM_SIZE - 1)];
        let hi = self.vram[(addr + 1) & (VRAM_SIZE - 1)];
        (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1)
    }

    fn map_pixel(&self, map_base: usize, x: u8, y: u8) -> u8 {
        let map_index = ((y as usize >> 3) << 5 | (x as usize >> 3)) & 0x3FF;
        let tile = self.vram[map_base + map_index];
        let addr = self.tile_data_addr(tile) + (y as usize & 7) * 2;
        self.tile_pixel(addr, 7 - (x & 7))
    }

    fn window_covers(&self, x: u8) -> bool {
        self.lcdc & LCDC_WINDOW_ENABLE != 0
            && self.wy <= self.ly
            && x as u16 + 7 >= self.wx as u16
            && self.wx < WINDOW_X_MAX
            && self.wy < WINDOW_Y_MAX
    }

    /// Colour index of the winning sprite at column `x`, if any sprite is
    /// opaque there.
    fn sprite_pixel(&self, sprites: &[Sprite], x: u8) -> Option<(Sprite, u8)> {
        let height = self.sprite_height();
        let mut best: Option<(Sprite, u8)> = None;
        for sprite in sprites {
            let col = (x as u16 + 8).wrapping_sub(sprite.x as u16);
            if col >= 8 {
                continue;
            }
            let mut row = self.ly + 16 - sprite.y;
            if sprite.flags & OBJ_FLIP_Y != 0 {
                row = height - 1 - row;
            }
            let tile = if height == 16 {
                sprite.tile & 0xFE
            } else {
                sprite.tile
            };
            let bit = if sprite.flags & OBJ_FLIP_X != 0 {
                col as u8
            } else {
                7 - col as u8
            };
            let index = self.tile_pixel(tile as usize * 16 + row as usize * 2, bit);
            if index == 0 {
                continue;
            }
            let wins = match best {
                None => true,
                Some((cur, _)) => {
                    (sprite.x, sprite.oam_index) < (cur.x, cur.oam_index)
                }
            };
            if wins {
                best = Some((*sprite, index));
            }
        }
        best
    }

    fn render_scanline(&mut self) {
        let ly = self.ly;
        if ly as usize >= SCREEN_HEIGHT {
            return;
        }

        let mut sprites = [Sprite::default(); MAX_SPRITES_PER_LINE];
        let count = if self.lcdc & LCDC_OBJ_ENABLE != 0 {
            self.line_sprites(&mut sprites)
        } else {
            0
        };
        debug_assert!(count <= MAX_SPRITES_PER_LINE);
        let sprites = &sprites[..count.min(MAX_SPRITES_PER_LINE)];

        let bg_map = if self.lcdc & LCDC_BG_MAP != 0 {
            BG_MAP_1_BASE
        } else {
            BG_MAP_0_BASE
        };
        let win_map = if self.lcdc & LCDC_WINDOW_MAP != 0 {
            BG_MAP_1_BASE
        } else {
            BG_MAP_0_BASE
        };

        let row = ly as usize * SCREEN_WIDTH;
        for x in 0..SCREEN_WIDTH as u8 {
            let bg_index = if self.lcdc & LCDC_BG_ENABLE == 0 {
                0
            } else if self.window_covers(x) {
                self.map_pixel(win_map, x + 7 - self.wx, ly - self.wy)
            } else {
                self.map_pixel(bg_map, x.wrapping_add(self.scx), ly.wrapping_add(self.scy))
            };

            let mut shade = dmg_shade(self.bgp, bg_index);
            if let Some((sprite, index)) = self.sprite_pixel(sprites, x) {
                let hidden = sprite.flags & OBJ_BEHIND_BG != 0 && bg_index != 0;
                if !hidden {
                    let palette = if sprite.flags & OBJ_PALETTE_1 != 0 {
                        self.obp1
                    } else {
                        self.obp0
                    };
                    shade = dmg_shade(palette, index);
                }
            }
            self.framebuffer[row + x as usize] = DMG_PALETTE[shade as usize];
        }
    }
}

fn dmg_shade(palette: u8, color_id: u8) -> u8 {
    debug_assert!(color_id <= 3, "colour index {color_id} out of range");
    let color_id = color_id.min(3);
    (palette >> (color_id * 2)) & 0x03
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

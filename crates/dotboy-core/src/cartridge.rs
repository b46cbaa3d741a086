use std::{fmt, fs, path::Path};

use log::{info, warn};

use crate::error::{Error, Result};

const ROM_BANK_SIZE: usize = 0x4000;
const RAM_BANK_SIZE: usize = 0x2000;
const HEADER_END: usize = 0x0150;

/// MBC1 selects ROM banks with a 5-bit register.
const MBC1_MAX_ROM_BANKS: usize = 0x20;
const MBC1_MAX_RAM_BANKS: usize = 4;

/// Cartridge type byte (0x147) names, indexed by value.
const CART_TYPE_NAMES: [&str; 35] = [
    "ROM ONLY",
    "MBC1",
    "MBC1+RAM",
    "MBC1+RAM+BATTERY",
    "invalid",
    "MBC2",
    "MBC2+BATTERY",
    "invalid",
    "ROM+RAM",
    "ROM+RAM+BATTERY",
    "invalid",
    "MMM01",
    "MMM01+RAM",
    "MMM01+RAM+BATTERY",
    "invalid",
    "MBC3+TIMER+BATTERY",
    "MBC3+TIMER+RAM+BATTERY",
    "MBC3",
    "MBC3+RAM",
    "MBC3+RAM+BATTERY",
    "invalid",
    "invalid",
    "invalid",
    "invalid",
    "invalid",
    "MBC5",
    "MBC5+RAM",
    "MBC5+RAM+BATTERY",
    "MBC5+RUMBLE",
    "MBC5+RUMBLE+RAM",
    "MBC5+RUMBLE+RAM+BATTERY",
    "invalid",
    "MBC6",
    "invalid",
    "MBC7+SENSOR+RUMBLE+RAM+BATTERY",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbcType {
    RomOnly,
    Mbc1,
}

impl MbcType {
    fn max_rom_len(self) -> usize {
        match self {
            MbcType::RomOnly => 2 * ROM_BANK_SIZE,
            MbcType::Mbc1 => MBC1_MAX_ROM_BANKS * ROM_BANK_SIZE,
        }
    }
}

/// Header fields reported when a cartridge is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeInfo {
    pub title: String,
    pub cgb_support: bool,
    pub sgb_support: bool,
    pub cart_type: u8,
    pub rom_size_code: u8,
    pub ram_size_code: u8,
}

impl CartridgeInfo {
    pub fn cart_type_name(&self) -> &'static str {
        CART_TYPE_NAMES
            .get(self.cart_type as usize)
            .copied()
            .unwrap_or("invalid")
    }

    pub fn rom_size_name(&self) -> &'static str {
        match self.rom_size_code {
            0 => "32KiB",
            1 => "64KiB",
            2 => "128KiB",
            3 => "256KiB",
            4 => "512KiB",
            5 => "1MiB",
            6 => "2MiB",
            7 => "4MiB",
            8 => "8MiB",
            _ => "Unknown",
        }
    }

    pub fn ram_size_name(&self) -> &'static str {
        match self.ram_size_code {
            0 => "No RAM",
            2 => "8KiB",
            3 => "32KiB",
            4 => "128KiB",
            5 => "64KiB",
            _ => "Unknown",
        }
    }

    /// Bytes of external RAM declared by the header.
    pub fn ram_len(&self) -> usize {
        match self.ram_size_code {
            0x02 => RAM_BANK_SIZE,
            0x03 => 4 * RAM_BANK_SIZE,
            0x04 => 16 * RAM_BANK_SIZE,
            0x05 => 8 * RAM_BANK_SIZE,
            _ => 0,
        }
    }

    pub fn mbc_type(&self) -> MbcType {
        match self.cart_type {
            0x00 | 0x08 | 0x09 => MbcType::RomOnly,
            0x01..=0x03 => MbcType::Mbc1,
            other => {
                warn!(
                    "Cartridge type {other:02X} ({}) is not supported; using MBC1 banking",
                    self.cart_type_name()
                );
                MbcType::Mbc1
            }
        }
    }
}

impl fmt::Display for CartridgeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yes_no = |b: bool| if b { "Yes" } else { "No" };
        writeln!(f, "Title: {}", self.title)?;
        writeln!(f, "CGB Support: {}", yes_no(self.cgb_support))?;
        writeln!(f, "SGB Support: {}", yes_no(self.sgb_support))?;
        writeln!(f, "Cart Type: {}", self.cart_type_name())?;
        writeln!(f, "ROM Size: {}", self.rom_size_name())?;
        write!(f, "RAM Size: {}", self.ram_size_name())
    }
}

#[derive(Debug)]
pub struct Cartridge {
    pub rom: Vec<u8>,
    pub ram: Vec<u8>,
    pub info: CartridgeInfo,
    pub mbc: MbcType,
    rom_bank: u8,
    ram_bank: u8,
    ram_enabled: bool,
    /// MBC1 banking mode; RAM banks other than 0 only map while set.
    ram_banking_mode: bool,
    /// Cartridge bytes hidden beneath a mapped boot ROM.
    boot_shadow: Option<Vec<u8>>,
}

impl Cartridge {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(&path)?;
        let cart = Self::load(data)?;
        info!(
            "Loaded ROM {}:\n{}",
            path.as_ref().display(),
            cart.info
        );
        Ok(cart)
    }

    pub fn load(data: Vec<u8>) -> Result<Self> {
        if data.len() < HEADER_END {
            return Err(Error::RomTooSmall { len: data.len() });
        }

        let info = Header::parse(&data).info();
        let mbc = info.mbc_type();
        let max = mbc.max_rom_len();
        if data.len() > max {
            return Err(Error::RomTooLarge {
                len: data.len(),
                max,
            });
        }

        let ram_len = match mbc {
            MbcType::RomOnly => info.ram_len().min(RAM_BANK_SIZE),
            MbcType::Mbc1 => info.ram_len().min(MBC1_MAX_RAM_BANKS * RAM_BANK_SIZE),
        };

        Ok(Self {
            rom: data,
            ram: vec![0; ram_len],
            mbc,
            info,
            rom_bank: 1,
            ram_bank: 0,
            ram_enabled: mbc == MbcType::RomOnly,
            ram_banking_mode: false,
            boot_shadow: None,
        })
    }

    /// Return the controller to its power-on banking state and drop any
    /// boot ROM overlay. RAM contents are kept.
    pub fn reset(&mut self) {
        self.unmap_boot_rom();
        self.rom_bank = 1;
        self.ram_bank = 0;
        self.ram_enabled = self.mbc == MbcType::RomOnly;
        self.ram_banking_mode = false;
    }

    /// Currently selected bank in the 0x4000-0x7FFF window.
    pub fn rom_bank(&self) -> u8 {
        self.rom_bank
    }

    pub fn boot_rom_mapped(&self) -> bool {
        self.boot_shadow.is_some()
    }

    /// Overlay `boot` on the start of ROM, keeping the covered cartridge bytes
    /// so [`Cartridge::unmap_boot_rom`] can put the header back.
    pub fn map_boot_rom(&mut self, boot: &[u8]) {
        self.unmap_boot_rom();
        let len = boot.len().min(self.rom.len());
        self.boot_shadow = Some(self.rom[..len].to_vec());
        self.rom[..len].copy_from_slice(&boot[..len]);
    }

    pub fn unmap_boot_rom(&mut self) {
        if let Some(shadow) = self.boot_shadow.take() {
            self.rom[..shadow.len()].copy_from_slice(&shadow);
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x3FFF => self.rom.get(addr as usize).copied().unwrap_or(0xFF),
            0x4000..=0x7FFF => {
                let offset = self.rom_bank as usize * ROM_BANK_SIZE + (addr as usize - 0x4000);
                self.rom.get(offset).copied().unwrap_or(0xFF)
            }
            0xA000..=0xBFFF => match self.ram_index(addr) {
                Some(idx) => self.ram[idx],
                None => 0xFF,
            },
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        match (self.mbc, addr) {
            (MbcType::Mbc1, 0x0000..=0x1FFF) => {
                self.ram_enabled = val & 0x0F == 0x0A;
            }
            (MbcType::Mbc1, 0x2000..=0x3FFF) => {
                // Bank 0 can never be mapped into the switchable window.
                let bank = val & 0x1F;
                self.rom_bank = if bank == 0 { 1 } else { bank };
            }
            (MbcType::Mbc1, 0x4000..=0x5FFF) => {
                self.ram_bank = val & 0x03;
            }
            (MbcType::Mbc1, 0x6000..=0x7FFF) => {
                self.ram_banking_mode = val & 0x01 != 0;
            }
            (_, 0xA000..=0xBFFF) => {
                if let Some(idx) = self.ram_index(addr) {
                    self.ram[idx] = val;
                }
            }
            _ => {}
        }
    }

    fn ram_index(&self, addr: u16) -> Option<usize> {
        if !self.ram_enabled || self.ram.is_empty() {
            return None;
        }
        let bank = if self.ram_banking_mode {
            self.ram_bank as usize
        } else {
            0
        };
        let idx = bank * RAM_BANK_SIZE + (addr as usize - 0xA000);
        (idx < self.ram.len()).then_some(idx)
    }
}

struct Header<'a> {
    data: &'a [u8],
}

impl<'a> Header<'a> {
    fn parse(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn byte(&self, offset: usize) -> u8 {
        self.data.get(offset).copied().unwrap_or(0)
    }

    fn title(&self) -> String {
        let end = 0x0143.min(self.data.len());
        let mut slice = &self.data[0x0134.min(end)..end];
        if let Some(pos) = slice.iter().position(|&b| b == 0) {
            slice = &slice[..pos];
        }
        String::from_utf8_lossy(slice).trim().to_string()
    }

    fn info(&self) -> CartridgeInfo {
        CartridgeInfo {
            title: self.title(),
            cgb_support: self.byte(0x0143) & 0x80 != 0,
            sgb_support: self.byte(0x0146) == 0x03,
            cart_type: self.byte(0x0147),
            rom_size_code: self.byte(0x0148),
            ram_size_code: self.byte(0x0149),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom_with_header(cart_type: u8, banks: usize) -> Vec<u8> {
        let mut rom = vec![0u8; banks * ROM_BANK_SIZE];
        rom[0x0147] = cart_type;
        for bank in 0..banks {
            rom[bank * ROM_BANK_SIZE + 0x100] = bank as u8;
        }
        rom
    }

    #[test]
    fn header_metadata_is_decoded() {
        let mut rom = rom_with_header(0x03, 4);
        rom[0x0134..0x0139].copy_from_slice(b"TETRA");
        rom[0x0143] = 0x80;
        rom[0x0146] = 0x03;
        rom[0x0148] = 0x01;
        rom[0x0149] = 0x03;

        let cart = Cartridge::load(rom).unwrap();
        assert_eq!(cart.info.title, "TETRA");
        assert!(cart.info.cgb_support);
        assert!(cart.info.sgb_support);
        assert_eq!(cart.info.cart_type_name(), "MBC1+RAM+BATTERY");
        assert_eq!(cart.info.rom_size_name(), "64KiB");
        assert_eq!(cart.info.ram_size_name(), "32KiB");
        assert_eq!(cart.ram.len(), 0x8000);
        assert_eq!(cart.mbc, MbcType::Mbc1);

        let text = cart.info.to_string();
        assert!(text.starts_with("Title: TETRA\n"));
        assert!(text.ends_with("RAM Size: 32KiB"));
    }

    #[test]
    fn unknown_codes_fall_back_to_names() {
        let info = CartridgeInfo {
            title: String::new(),
            cgb_support: false,
            sgb_support: false,
            cart_type: 0xFC,
            rom_size_code: 0x52,
            ram_size_code: 0x01,
        };
        assert_eq!(info.cart_type_name(), "invalid");
        assert_eq!(info.rom_size_name(), "Unknown");
        assert_eq!(info.ram_size_name(), "Unknown");
        assert_eq!(info.ram_len(), 0);
    }

    #[test]
    fn bank_zero_write_selects_bank_one() {
        let mut cart = Cartridge::load(rom_with_header(0x01, 8)).unwrap();
        cart.write(0x2000, 0x03);
        assert_eq!(cart.read(0x4100), 3);
        cart.write(0x2000, 0x00);
        assert_eq!(cart.rom_bank(), 1);
        assert_eq!(cart.read(0x4100), 1);
    }

    #[test]
    fn bank_number_is_five_bits() {
        let mut cart = Cartridge::load(rom_with_header(0x01, 32)).unwrap();
        cart.write(0x3FFF, 0x25);
        assert_eq!(cart.rom_bank(), 0x05);
        assert_eq!(cart.read(0x4100), 5);
        cart.write(0x2000, 0xFF);
        assert_eq!(cart.read(0x4100), 0x1F);
        cart.write(0x2000, 0x20);
        assert_eq!(cart.rom_bank(), 1);
    }

    #[test]
    fn fixed_window_ignores_bank_register() {
        let mut cart = Cartridge::load(rom_with_header(0x01, 4)).unwrap();
        cart.write(0x2000, 0x02);
        assert_eq!(cart.read(0x0100), 0);
    }

    #[test]
    fn ram_requires_enable() {
        let mut rom = rom_with_header(0x02, 2);
        rom[0x0149] = 0x03;
        let mut cart = Cartridge::load(rom).unwrap();

        cart.write(0xA000, 0x42);
        assert_eq!(cart.read(0xA000), 0xFF);

        cart.write(0x0000, 0x0A);
        cart.write(0xA000, 0x42);
        assert_eq!(cart.read(0xA000), 0x42);

        cart.write(0x6000, 0x01);
        cart.write(0x4000, 0x02);
        assert_eq!(cart.read(0xA000), 0x00);
        cart.write(0xBFFF, 0x99);
        cart.write(0x4000, 0x00);
        assert_eq!(cart.read(0xA000), 0x42);
        assert_eq!(cart.ram[2 * RAM_BANK_SIZE + 0x1FFF], 0x99);

        cart.write(0x1000, 0x00);
        assert_eq!(cart.read(0xA000), 0xFF);
    }

    #[test]
    fn rom_only_ignores_bank_writes() {
        let mut cart = Cartridge::load(rom_with_header(0x00, 2)).unwrap();
        cart.write(0x2000, 0x05);
        assert_eq!(cart.read(0x4100), 1);
        assert_eq!(cart.mbc, MbcType::RomOnly);
    }

    #[test]
    fn boot_overlay_restores_header() {
        let mut rom = rom_with_header(0x00, 2);
        rom[0x0000] = 0xC3;
        let mut cart = Cartridge::load(rom).unwrap();
        cart.map_boot_rom(&[0x31; 0x100]);
        assert!(cart.boot_rom_mapped());
        assert_eq!(cart.read(0x0000), 0x31);
        assert_eq!(cart.read(0x00FF), 0x31);
        assert_eq!(cart.read(0x0100), 0x00);

        cart.unmap_boot_rom();
        assert!(!cart.boot_rom_mapped());
        assert_eq!(cart.read(0x0000), 0xC3);
        assert_eq!(cart.read(0x00FF), 0x00);
    }

    #[test]
    fn rejects_truncated_and_oversized_images() {
        assert!(matches!(
            Cartridge::load(vec![0; 0x100]),
            Err(Error::RomTooSmall { len: 0x100 })
        ));
        assert!(matches!(
            Cartridge::load(rom_with_header(0x00, 4)),
            Err(Error::RomTooLarge { max: 0x8000, .. })
        ));
        assert!(matches!(
            Cartridge::load(rom_with_header(0x01, 33)),
            Err(Error::RomTooLarge { max: 0x80000, .. })
        ));
    }
}

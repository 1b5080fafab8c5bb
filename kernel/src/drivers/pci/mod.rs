//! PCI discovery: just enough to walk bus 0-255/slot 0-31/function 0-7,
//! log what's found, and confirm a PATA/IDE controller exists before the
//! ATA driver is trusted. No capability parsing, no BARs, no MSI.

use terminal::{log, Port32};

const CONFIG_ADDRESS: Port32 = Port32::new(0xCF8);
const CONFIG_DATA: Port32 = Port32::new(0xCFC);

const CLASS_MASS_STORAGE: u8 = 0x01;
const SUBCLASS_IDE: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciDevice {
    pub bus: u8,
    pub slot: u8,
    pub function: u8,
    pub vendor_id: u16,
    pub device_id: u16,
    pub class: u8,
    pub subclass: u8,
    pub prog_if: u8,
}

impl PciDevice {
    pub fn is_ide_controller(&self) -> bool {
        self.class == CLASS_MASS_STORAGE && self.subclass == SUBCLASS_IDE
    }
}

fn config_address(bus: u8, slot: u8, function: u8, offset: u8) -> u32 {
    0x8000_0000
        | (bus as u32) << 16
        | (slot as u32) << 11
        | (function as u32) << 8
        | (offset as u32 & 0xFC)
}

fn read_config(bus: u8, slot: u8, function: u8, offset: u8) -> u32 {
    CONFIG_ADDRESS.write(config_address(bus, slot, function, offset));
    CONFIG_DATA.read()
}

fn probe(bus: u8, slot: u8, function: u8) -> Option<PciDevice> {
    let id_word = read_config(bus, slot, function, 0x00);
    let vendor_id = (id_word & 0xFFFF) as u16;
    if vendor_id == 0xFFFF {
        return None;
    }
    let device_id = (id_word >> 16) as u16;
    let class_word = read_config(bus, slot, function, 0x08);
    Some(PciDevice {
        bus,
        slot,
        function,
        vendor_id,
        device_id,
        prog_if: ((class_word >> 8) & 0xFF) as u8,
        subclass: ((class_word >> 16) & 0xFF) as u8,
        class: ((class_word >> 24) & 0xFF) as u8,
    })
}

/// An iterator-friendly full bus scan. Every slot is probed at function 0
/// only -- multi-function devices beyond that aren't a concern for a boot
///-time IDE-controller check.
pub fn scan_bus() -> impl Iterator<Item = PciDevice> {
    (0u16..256).flat_map(|bus| {
        (0u8..32).filter_map(move |slot| probe(bus as u8, slot, 0))
    })
}

pub fn init() {
    let mut ide_found = false;
    for device in scan_bus() {
        log!(
            "drivers::pci: {:02x}:{:02x}.{} vendor={:#06x} device={:#06x} class={:#04x}:{:#04x}",
            device.bus, device.slot, device.function, device.vendor_id, device.device_id,
            device.class, device.subclass
        );
        if device.is_ide_controller() {
            ide_found = true;
        }
    }
    if !ide_found {
        log!("drivers::pci: no PATA/IDE controller found on the bus");
    }
}

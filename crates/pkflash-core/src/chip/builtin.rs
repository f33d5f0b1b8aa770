//! Compiled-in chip table

use super::{ChipDescriptor, Features};

const NONE: Features = Features::empty();
const OSCCAL: Features = Features::OSCCAL;
const ADAPTER: Features = Features::ADAPTER;

/// Chips supported by PICkit 1 firmware 2.0.x, terminated by a sentinel
pub static CHIPS: [ChipDescriptor; 24] = [
    ChipDescriptor::new(0x0F80, "12F629", 0x03FF, 128, OSCCAL, 0x01FF),
    ChipDescriptor::new(0x0FC0, "12F675", 0x03FF, 128, OSCCAL, 0x01FF),
    ChipDescriptor::new(0x10C0, "16F630", 0x03FF, 128, OSCCAL, 0x01FF),
    ChipDescriptor::new(0x10E0, "16F676", 0x03FF, 128, OSCCAL, 0x01FF),
    ChipDescriptor::new(0x0FA0, "16F635", 0x0400, 256, NONE, 0x1FFF),
    ChipDescriptor::new(0x0460, "16F683", 0x0800, 256, NONE, 0x0FFF),
    ChipDescriptor::new(0x10A0, "16F636/639", 0x0800, 256, NONE, 0x1FFF),
    ChipDescriptor::new(0x1080, "16F684", 0x0800, 256, NONE, 0x0FFF),
    ChipDescriptor::new(0x04A0, "16F685", 0x1000, 256, NONE, 0x0FFF),
    ChipDescriptor::new(0x1320, "16F687", 0x0800, 256, NONE, 0x0FFF),
    ChipDescriptor::new(0x1180, "16F688", 0x1000, 256, NONE, 0x0FFF),
    ChipDescriptor::new(0x1340, "16F689", 0x1000, 256, NONE, 0x0FFF),
    ChipDescriptor::new(0x1400, "16F690", 0x1000, 256, NONE, 0x0FFF),
    // 18-pin and larger parts sit in an adapter (see Microchip TB079)
    ChipDescriptor::new(0x1140, "16F716", 0x0800, 0, ADAPTER, 0x00CF),
    ChipDescriptor::new(0x1040, "16F627A", 0x0400, 128, ADAPTER, 0x00FF),
    ChipDescriptor::new(0x1060, "16F628A", 0x0800, 128, ADAPTER, 0x00FF),
    ChipDescriptor::new(0x1100, "16F648A", 0x1000, 256, ADAPTER, 0x00FF),
    ChipDescriptor::new(0x1200, "16F785", 0x0800, 256, ADAPTER, 0x0FFF),
    ChipDescriptor::new(0x0E20, "16F877A", 0x2000, 256, ADAPTER, 0x2FC7),
    ChipDescriptor::new(0x13E0, "16F913", 0x1000, 256, ADAPTER, 0x1FFF),
    ChipDescriptor::new(0x13C0, "16F914", 0x1000, 256, ADAPTER, 0x1FFF),
    ChipDescriptor::new(0x1380, "16F917", 0x2000, 256, ADAPTER, 0x1FFF),
    ChipDescriptor::new(0x13A0, "16F916", 0x2000, 256, ADAPTER, 0x1FFF),
    ChipDescriptor::sentinel(),
];

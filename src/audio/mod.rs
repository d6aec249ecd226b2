pub mod pads;
pub mod sample;

pub const PAD_COUNT: usize = 9;

/// static pad definition: display label, key trigger, sample on disk
pub struct PadDef {
    pub label: &'static str,
    pub key: char,
    pub path: &'static str,
}

/// the fixed kit, one pad per grid cell in reading order
pub const PADS: [PadDef; PAD_COUNT] = [
    PadDef { label: "Heater-1", key: 'Q', path: "sounds/Heater-1.mp3" },
    PadDef { label: "Heater-2", key: 'W', path: "sounds/Heater-2.mp3" },
    PadDef { label: "Heater-3", key: 'E', path: "sounds/Heater-3.mp3" },
    PadDef { label: "Heater-4", key: 'A', path: "sounds/Heater-4_1.mp3" },
    PadDef { label: "Clap", key: 'S', path: "sounds/Heater-6.mp3" },
    PadDef { label: "Open-HH", key: 'D', path: "sounds/Dsc_Oh.mp3" },
    PadDef { label: "Kick-n'-Hat", key: 'Z', path: "sounds/Kick_n_Hat.mp3" },
    PadDef { label: "Kick", key: 'X', path: "sounds/RP4_KICK_1.mp3" },
    PadDef { label: "Closed-HH", key: 'C', path: "sounds/Cev_H2.mp3" },
];

/// audio command
pub enum Cmd {
    /// restart the pad's sample from frame zero at the current master volume
    Trigger(u8),
    /// master volume in [0, 1]
    Volume(f32),
}

use crate::{audio, tui};

use color_eyre::Result;
use std::sync::mpsc::Sender;

pub const DEFAULT_VOLUME: f32 = 0.5;
/// master volume step for key nudges
pub const VOLUME_STEP: f32 = 0.05;

/// global console state: power, master volume, and the command fan-out
/// to the audio thread and the ui. both trigger sources (key and pointer)
/// funnel through [`Console::pad`].
pub struct Console {
    power: bool,
    volume: f32,
    loaded: [bool; audio::PAD_COUNT],

    pads_tx: Sender<audio::Cmd>,
    tui_tx: Sender<tui::Cmd>,
}

impl Console {
    pub fn new(
        loaded: [bool; audio::PAD_COUNT],
        pads_tx: Sender<audio::Cmd>,
        tui_tx: Sender<tui::Cmd>,
    ) -> Self {
        Self {
            power: true,
            volume: DEFAULT_VOLUME,
            loaded,
            pads_tx,
            tui_tx,
        }
    }

    /// match a pressed character against the pad table, case-insensitively
    pub fn key(&mut self, c: char) -> Result<()> {
        let c = c.to_ascii_uppercase();
        if let Some(index) = audio::PADS.iter().position(|pad| pad.key == c) {
            self.pad(index as u8)?;
        }
        Ok(())
    }

    /// trigger one pad: no-op while powered off or when its sample never loaded
    pub fn pad(&mut self, index: u8) -> Result<()> {
        if !self.power || !self.loaded[index as usize] {
            return Ok(());
        }
        self.pads_tx.send(audio::Cmd::Trigger(index))?;
        self.tui_tx.send(tui::Cmd::Pad(index))?;
        Ok(())
    }

    pub fn toggle_power(&mut self) -> Result<()> {
        self.set_power(!self.power)
    }

    /// flip the power flag; in-flight voices and pulses are left to run out
    pub fn set_power(&mut self, power: bool) -> Result<()> {
        self.power = power;
        self.tui_tx.send(tui::Cmd::Power(power))?;
        let msg = if power { "POWER ON" } else { "POWER OFF" };
        self.tui_tx.send(tui::Cmd::Display(msg.to_string()))?;
        Ok(())
    }

    pub fn nudge_volume(&mut self, delta: f32) -> Result<()> {
        self.set_volume(self.volume + delta)
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.volume = volume.clamp(0., 1.);
        self.pads_tx.send(audio::Cmd::Volume(self.volume))?;
        self.tui_tx.send(tui::Cmd::Volume(self.volume))?;
        self.tui_tx.send(tui::Cmd::Display(format!(
            "VOLUME: {}%",
            (self.volume * 100.).round() as u8
        )))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{channel, Receiver};

    fn console() -> (Console, Receiver<audio::Cmd>, Receiver<tui::Cmd>) {
        let (pads_tx, pads_rx) = channel();
        let (tui_tx, tui_rx) = channel();
        (
            Console::new([true; audio::PAD_COUNT], pads_tx, tui_tx),
            pads_rx,
            tui_rx,
        )
    }

    fn displays(tui_rx: &Receiver<tui::Cmd>) -> Vec<String> {
        tui_rx
            .try_iter()
            .filter_map(|cmd| match cmd {
                tui::Cmd::Display(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn trigger_characters_are_unique_and_uppercase() {
        for (i, a) in audio::PADS.iter().enumerate() {
            assert!(a.key.is_ascii_uppercase());
            for b in &audio::PADS[i + 1..] {
                assert_ne!(a.key, b.key);
            }
        }
    }

    #[test]
    fn key_matches_case_insensitively() {
        let (mut console, pads_rx, tui_rx) = console();
        console.key('q').unwrap();
        assert!(matches!(pads_rx.try_recv(), Ok(audio::Cmd::Trigger(0))));
        assert!(matches!(tui_rx.try_recv(), Ok(tui::Cmd::Pad(0))));

        console.key('Q').unwrap();
        assert!(matches!(pads_rx.try_recv(), Ok(audio::Cmd::Trigger(0))));

        console.key('h').unwrap();
        assert!(pads_rx.try_recv().is_err());
    }

    #[test]
    fn powered_off_trigger_is_a_no_op() {
        let (mut console, pads_rx, tui_rx) = console();
        console.set_power(false).unwrap();
        while tui_rx.try_recv().is_ok() {}

        console.pad(0).unwrap();
        assert!(pads_rx.try_recv().is_err());
        assert!(tui_rx.try_recv().is_err());
    }

    #[test]
    fn unloaded_pad_is_a_no_op() {
        let (pads_tx, pads_rx) = channel();
        let (tui_tx, tui_rx) = channel();
        let mut loaded = [true; audio::PAD_COUNT];
        loaded[3] = false;
        let mut console = Console::new(loaded, pads_tx, tui_tx);

        console.pad(3).unwrap();
        assert!(pads_rx.try_recv().is_err());
        assert!(tui_rx.try_recv().is_err());

        console.pad(4).unwrap();
        assert!(matches!(pads_rx.try_recv(), Ok(audio::Cmd::Trigger(4))));
    }

    #[test]
    fn power_toggle_writes_fixed_messages() {
        let (mut console, _pads_rx, tui_rx) = console();
        console.toggle_power().unwrap();
        assert!(!console.power);
        assert_eq!(displays(&tui_rx), ["POWER OFF"]);

        console.toggle_power().unwrap();
        assert!(console.power);
        assert_eq!(displays(&tui_rx), ["POWER ON"]);
    }

    #[test]
    fn volume_is_clamped_and_displayed() {
        let (mut console, pads_rx, tui_rx) = console();
        console.set_volume(0.73).unwrap();
        assert!(matches!(pads_rx.try_recv(), Ok(audio::Cmd::Volume(v)) if v == 0.73));
        assert_eq!(displays(&tui_rx), ["VOLUME: 73%"]);

        console.set_volume(1.5).unwrap();
        assert_eq!(console.volume, 1.);
        assert_eq!(displays(&tui_rx), ["VOLUME: 100%"]);

        console.set_volume(-0.2).unwrap();
        assert_eq!(console.volume, 0.);
        assert_eq!(displays(&tui_rx), ["VOLUME: 0%"]);
    }

    #[test]
    fn volume_nudges_step_and_saturate() {
        let (mut console, _pads_rx, _tui_rx) = console();
        console.nudge_volume(VOLUME_STEP).unwrap();
        assert!((console.volume - 0.55).abs() < 1e-6);

        for _ in 0..20 {
            console.nudge_volume(VOLUME_STEP).unwrap();
        }
        assert_eq!(console.volume, 1.);
    }
}

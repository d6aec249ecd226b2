use super::sample::Sample;

use cpal::{FromSample, SizedSample};

/// one playing voice: frame position and the gain captured at trigger time
struct Voice {
    pos: usize,
    gain: f32,
}

struct Pad {
    sample: Option<Sample>,
    voice: Option<Voice>,
}

pub struct PadsHandler<const N: usize> {
    volume: f32,
    pads: [Pad; N],
    cmd_rx: std::sync::mpsc::Receiver<super::Cmd>,
}

impl<const N: usize> PadsHandler<N> {
    pub fn new(
        samples: [Option<Sample>; N],
        cmd_rx: std::sync::mpsc::Receiver<super::Cmd>,
    ) -> Self {
        Self {
            volume: crate::input::DEFAULT_VOLUME,
            pads: samples.map(|sample| Pad {
                sample,
                voice: None,
            }),
            cmd_rx,
        }
    }

    /// fill one output buffer: drain pending commands, then mix active voices
    pub fn tick<T>(&mut self, buffer: &mut [T], channels: usize)
    where
        T: SizedSample + FromSample<f32>,
    {
        while let Ok(cmd) = self.cmd_rx.try_recv() {
            match cmd {
                super::Cmd::Trigger(index) => self.trigger(index),
                super::Cmd::Volume(volume) => self.volume = volume,
            }
        }
        self.mix(buffer, channels);
    }

    /// restart the pad's own voice from frame zero at the current master volume
    fn trigger(&mut self, index: u8) {
        let pad = &mut self.pads[index as usize];
        if pad.sample.is_some() {
            pad.voice = Some(Voice {
                pos: 0,
                gain: self.volume,
            });
        }
    }

    fn mix<T>(&mut self, buffer: &mut [T], channels: usize)
    where
        T: SizedSample + FromSample<f32>,
    {
        let mut chunks = buffer.chunks_exact_mut(channels);
        for frame in &mut chunks {
            let mut l = 0.;
            let mut r = 0.;
            for pad in self.pads.iter_mut() {
                let Some(sample) = &pad.sample else { continue };
                let Some(voice) = &mut pad.voice else { continue };
                let [sl, sr] = sample.frames()[voice.pos];
                l += sl * voice.gain;
                r += sr * voice.gain;
                voice.pos += 1;
                if voice.pos >= sample.frames().len() {
                    pad.voice = None;
                }
            }
            if channels == 1 {
                frame[0] = T::from_sample((l + r) * 0.5);
            } else {
                frame[0] = T::from_sample(l);
                frame[1] = T::from_sample(r);
                for s in &mut frame[2..] {
                    *s = T::EQUILIBRIUM;
                }
            }
        }
        for s in chunks.into_remainder() {
            *s = T::EQUILIBRIUM;
        }
    }
}

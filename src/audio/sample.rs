use std::{fs::File, path::Path};

use color_eyre::{eyre::eyre, Result};
use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error as SymphoniaError,
    formats::FormatOptions, io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};

/// one preloaded pad sample: interleaved stereo frames at the output stream rate
pub struct Sample {
    frames: Vec<[f32; 2]>,
}

impl Sample {
    pub(crate) fn from_frames(frames: Vec<[f32; 2]>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[[f32; 2]] {
        &self.frames
    }

    /// decode an audio file into stereo frames at `output_rate`
    pub fn decode(path: &Path, output_rate: u32) -> Result<Self> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| eyre!("no default track in `{}`", path.display()))?;
        let track_id = track.id;
        let rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| eyre!("missing sample rate in `{}`", path.display()))?;
        let channels = track
            .codec_params
            .channels
            .ok_or_else(|| eyre!("missing channel spec in `{}`", path.display()))?
            .count();
        let mut decoder =
            symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

        let mut samples = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            if packet.track_id() != track_id {
                continue;
            }
            let decoded = decoder.decode(&packet)?;
            let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }

        let frames = to_stereo(samples, channels)?;
        Ok(Self::from_frames(resample(frames, rate, output_rate)))
    }
}

fn to_stereo(samples: Vec<f32>, channels: usize) -> Result<Vec<[f32; 2]>> {
    match channels {
        1 => Ok(samples.iter().map(|&s| [s, s]).collect()),
        2 => Ok(samples.chunks_exact(2).map(|f| [f[0], f[1]]).collect()),
        n => Err(eyre!("unsupported channel count: {n}")),
    }
}

/// linear-interpolation rate conversion; identity when rates match
fn resample(frames: Vec<[f32; 2]>, from: u32, to: u32) -> Vec<[f32; 2]> {
    if from == to || frames.is_empty() {
        return frames;
    }
    let step = from as f32 / to as f32;
    let len = (frames.len() as f32 / step).ceil() as usize;
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let pos = i as f32 * step;
        let index = (pos as usize).min(frames.len() - 1);
        let next = (index + 1).min(frames.len() - 1);
        let frac = pos.fract();
        let a = frames[index];
        let b = frames[next];
        out.push([
            a[0] * (1. - frac) + b[0] * frac,
            a[1] * (1. - frac) + b[1] * frac,
        ]);
    }
    out
}

/// resolve the whole pad table once; a pad whose sample fails to decode stays unloaded
pub fn preload(output_rate: u32) -> [Option<Sample>; super::PAD_COUNT] {
    core::array::from_fn(|i| {
        let def = &super::PADS[i];
        match Sample::decode(Path::new(def.path), output_rate) {
            Ok(sample) => {
                log::debug!("loaded `{}` ({} frames)", def.path, sample.frames().len());
                Some(sample)
            }
            Err(e) => {
                log::warn!("pad {} sample `{}` unavailable: {e}", def.key, def.path);
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_pcm16_wav(
        path: &Path,
        channels: u16,
        rate: u32,
        samples: &[i16],
    ) -> std::io::Result<()> {
        let block_align = channels * 2;
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::with_capacity(44 + samples.len() * 2);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&rate.to_le_bytes());
        out.extend_from_slice(&(rate * block_align as u32).to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        std::fs::write(path, out)
    }

    #[test]
    fn decodes_mono_into_duplicated_stereo_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_pcm16_wav(&path, 1, 44_100, &[0, 16_384, -16_384, i16::MAX]).unwrap();

        let sample = Sample::decode(&path, 44_100).unwrap();
        assert_eq!(sample.frames().len(), 4);
        for frame in sample.frames() {
            assert!((frame[0] - frame[1]).abs() < 1e-6);
        }
        assert!((sample.frames()[1][0] - 0.5).abs() < 1e-2);
    }

    #[test]
    fn stereo_passthrough_keeps_frame_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_pcm16_wav(&path, 2, 44_100, &[0, 0, 16_384, -16_384, 0, 0]).unwrap();

        let sample = Sample::decode(&path, 44_100).unwrap();
        assert_eq!(sample.frames().len(), 3);
        assert!((sample.frames()[1][0] - 0.5).abs() < 1e-2);
        assert!((sample.frames()[1][1] + 0.5).abs() < 1e-2);
    }

    #[test]
    fn resamples_to_output_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slow.wav");
        let samples = vec![8_192i16; 100];
        write_pcm16_wav(&path, 1, 22_050, &samples).unwrap();

        let sample = Sample::decode(&path, 44_100).unwrap();
        assert!((sample.frames().len() as isize - 200).unsigned_abs() <= 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Sample::decode(Path::new("sounds/definitely-missing.wav"), 48_000).is_err());
    }

    #[test]
    fn resample_interpolates_between_frames() {
        let frames = vec![[0., 0.], [1., 1.]];
        let out = resample(frames, 22_050, 44_100);
        assert_eq!(out.len(), 4);
        assert!(out[0][0].abs() < 1e-6);
        assert!((out[1][0] - 0.5).abs() < 1e-6);
        assert!((out[2][0] - 1.).abs() < 1e-6);
    }
}

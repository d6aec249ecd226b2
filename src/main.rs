mod audio;
mod input;
mod tui;

use std::io::Write;

use color_eyre::Result;
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    FromSample, SizedSample,
};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let (tui_tx, tui_rx) = std::sync::mpsc::channel::<tui::Cmd>();
    let (pads_tx, pads_rx) = std::sync::mpsc::channel::<audio::Cmd>();

    let hosts = cpal::available_hosts();
    let id = match hosts.len() {
        0 => return Err(color_eyre::Report::msg("no audio host found")),
        1 => {
            println!("selected only available audio host: {}", hosts[0].name(),);
            hosts[0]
        }
        _ => {
            println!("available audio hosts:");
            for (i, h) in hosts.iter().enumerate() {
                println!("{}: {}", i, h.name())
            }
            print!("select an audio host: ");
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            *hosts
                .get(line.trim().parse::<usize>()?)
                .ok_or(color_eyre::Report::msg("invalid audio host selected"))?
        }
    };
    let host = cpal::host_from_id(id)?;

    let devices = host.output_devices().into_iter().flatten().collect::<Vec<_>>();
    let device = match devices.len() {
        0 => return Err(color_eyre::Report::msg("no audio device found")),
        1 => {
            println!(
                "\nselected only available audio device: {}",
                devices[0].name()?,
            );
            devices[0].clone()
        }
        _ => {
            println!("\navailable audio devices:");
            for (i, d) in devices.iter().enumerate() {
                println!("{}: {}", i, d.name()?)
            }
            print!("select an audio device: ");
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            devices
                .get(line.trim().parse::<usize>()?)
                .ok_or(color_eyre::Report::msg("invalid audio device selected"))?
                .clone()
        }
    };

    let config = device.default_output_config()?;
    let samples = audio::sample::preload(config.sample_rate().0);
    let loaded = core::array::from_fn(|i| samples[i].is_some());

    let audio_handle = std::thread::spawn(move || -> Result<()> {
        let pads = audio::pads::PadsHandler::new(samples, pads_rx);
        match config.sample_format() {
            cpal::SampleFormat::I16 => play::<i16>(&device, &config.into(), pads)?,
            cpal::SampleFormat::F32 => play::<f32>(&device, &config.into(), pads)?,
            sample_format => {
                return Err(color_eyre::Report::msg(format!(
                    "unsupported sample format: {}",
                    sample_format
                )))
            }
        }
        Ok(())
    });

    let mut console = input::Console::new(loaded, pads_tx, tui_tx);

    let mut terminal = ratatui::init();
    crossterm::execute!(std::io::stdout(), EnableMouseCapture)?;
    let result = tui::Tui::default().run(&mut terminal, &mut console, tui_rx);
    let _ = crossterm::execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    // the stream thread parks after starting playback; wake it once the ui is done
    drop(console);
    audio_handle.thread().unpark();
    audio_handle.join().unwrap()?;

    result
}

fn play<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut pads: audio::pads::PadsHandler<{ audio::PAD_COUNT }>,
) -> Result<()>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;

    let out_fn = move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        pads.tick(data, channels);
    };
    let err_fn = |err| log::error!("error occurred on stream: {}", err);
    let stream = device.build_output_stream(config, out_fn, err_fn, None)?;

    stream.play()?;
    std::thread::park();

    Ok(())
}

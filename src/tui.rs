use crate::audio::{PAD_COUNT, PADS};
use crate::input::{self, Console};

use color_eyre::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Margin, Position, Rect},
    style::Stylize,
    text::{Line, Text},
    widgets::{Block, Gauge, Padding, Paragraph, Widget},
    DefaultTerminal, Frame,
};
use std::{
    collections::VecDeque,
    sync::mpsc::{Receiver, TryRecvError},
    time::{Duration, Instant},
};

/// visual pulse per trigger; every deadline clears the flag when it elapses,
/// whether or not a later trigger re-set it in the meantime
pub const PULSE_DURATION: Duration = Duration::from_millis(100);
const POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// ui command
pub enum Cmd {
    /// pad triggered: show its label and start a pulse
    Pad(u8),
    Display(String),
    Power(bool),
    Volume(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Target {
    Pad(u8),
    Power,
    Volume(f32),
}

/// rects the last frame was laid out into, kept for pointer hit-testing
#[derive(Default, Clone, Copy)]
struct Regions {
    header: Rect,
    pads: [Rect; PAD_COUNT],
    display: Rect,
    power: Rect,
    slider: Rect,
}

impl Regions {
    fn compute(area: Rect) -> Self {
        let [header, body] =
            Layout::vertical([Constraint::Length(4), Constraint::Min(12)]).areas(area);
        let [grid, controls] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(body);

        let rows: [Rect; 3] = Layout::vertical([Constraint::Length(5); 3])
            .flex(Flex::Center)
            .areas(grid);
        let mut pads = [Rect::default(); PAD_COUNT];
        for (r, row) in rows.into_iter().enumerate() {
            let cells: [Rect; 3] = Layout::horizontal([Constraint::Length(9); 3])
                .flex(Flex::Center)
                .spacing(1)
                .areas(row);
            for (c, cell) in cells.into_iter().enumerate() {
                pads[r * 3 + c] = cell;
            }
        }

        let [display, power, slider] = Layout::vertical([Constraint::Length(3); 3])
            .flex(Flex::Center)
            .horizontal_margin(2)
            .areas(controls);

        Self {
            header,
            pads,
            display,
            power,
            slider,
        }
    }

    /// map a click column onto the slider track, proportionally
    fn slider_value(&self, x: u16) -> Option<f32> {
        let track = self.slider.inner(Margin::new(1, 1));
        if track.width < 2 {
            return None;
        }
        let x = x.clamp(track.x, track.x + track.width - 1);
        Some((x - track.x) as f32 / (track.width - 1) as f32)
    }
}

pub struct Tui {
    exit: bool,
    power: bool,
    volume: f32,
    display: String,
    active: [bool; PAD_COUNT],
    pulses: [VecDeque<Instant>; PAD_COUNT],
    regions: Regions,
}

impl Default for Tui {
    fn default() -> Self {
        Self {
            exit: false,
            power: true,
            volume: input::DEFAULT_VOLUME,
            display: String::from("READY"),
            active: [false; PAD_COUNT],
            pulses: core::array::from_fn(|_| VecDeque::new()),
            regions: Regions::default(),
        }
    }
}

impl Tui {
    pub fn run(
        &mut self,
        terminal: &mut DefaultTerminal,
        console: &mut Console,
        cmd_rx: Receiver<Cmd>,
    ) -> Result<()> {
        terminal.draw(|frame| self.draw(frame))?;
        while !self.exit {
            let mut flush = self.expire_pulses(Instant::now());
            if event::poll(POLL_TIMEOUT)? {
                self.event(event::read()?, console)?;
                flush = true;
            }
            loop {
                match cmd_rx.try_recv() {
                    Ok(cmd) => {
                        self.cmd(cmd);
                        flush = true;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(e) => Err(e)?,
                }
            }
            if flush {
                terminal.draw(|frame| self.draw(frame))?;
            }
        }
        Ok(())
    }

    fn event(&mut self, event: Event, console: &mut Console) -> Result<()> {
        match event {
            Event::Key(key) => self.kbd(key, console)?,
            Event::Mouse(mouse) => self.mouse(mouse, console)?,
            _ => (),
        }
        Ok(())
    }

    fn kbd(&mut self, key: KeyEvent, console: &mut Console) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        match key.code {
            KeyCode::Esc => self.exit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.exit = true;
            }
            KeyCode::Left => console.nudge_volume(-input::VOLUME_STEP)?,
            KeyCode::Right => console.nudge_volume(input::VOLUME_STEP)?,
            KeyCode::Char(c) if c.eq_ignore_ascii_case(&'p') => console.toggle_power()?,
            KeyCode::Char(c) => console.key(c)?,
            _ => (),
        }
        Ok(())
    }

    fn mouse(&mut self, mouse: MouseEvent, console: &mut Console) -> Result<()> {
        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            match self.hit(Position::new(mouse.column, mouse.row)) {
                Some(Target::Pad(index)) => console.pad(index)?,
                Some(Target::Power) => console.toggle_power()?,
                Some(Target::Volume(volume)) => console.set_volume(volume)?,
                None => (),
            }
        }
        Ok(())
    }

    fn hit(&self, pos: Position) -> Option<Target> {
        if let Some(index) = self.regions.pads.iter().position(|r| r.contains(pos)) {
            return Some(Target::Pad(index as u8));
        }
        if self.regions.power.contains(pos) {
            return Some(Target::Power);
        }
        if self.regions.slider.contains(pos) {
            return self.regions.slider_value(pos.x).map(Target::Volume);
        }
        None
    }

    fn cmd(&mut self, cmd: Cmd) {
        self.cmd_at(cmd, Instant::now());
    }

    /// apply one console command; `now` stamps the pulse deadline for pad triggers
    fn cmd_at(&mut self, cmd: Cmd, now: Instant) {
        match cmd {
            Cmd::Pad(index) => {
                if self.power {
                    self.display = PADS[index as usize].label.replace('-', " ");
                    self.active[index as usize] = true;
                    self.pulses[index as usize].push_back(now + PULSE_DURATION);
                }
            }
            Cmd::Display(text) => self.display = text,
            Cmd::Power(power) => self.power = power,
            Cmd::Volume(volume) => self.volume = volume,
        }
    }

    /// every elapsed deadline clears its pad's flag, even one re-set by a later trigger
    fn expire_pulses(&mut self, now: Instant) -> bool {
        let mut fired = false;
        for (active, pulses) in self.active.iter_mut().zip(self.pulses.iter_mut()) {
            while pulses.front().is_some_and(|&deadline| deadline <= now) {
                pulses.pop_front();
                *active = false;
                fired = true;
            }
        }
        fired
    }

    fn draw(&mut self, frame: &mut Frame) {
        self.regions = Regions::compute(frame.area());
        frame.render_widget(&*self, frame.area());
    }
}

impl Widget for &Tui {
    fn render(self, _area: Rect, buf: &mut Buffer) {
        // header
        Paragraph::new(Text::from(vec![
            Line::raw("VIBE STATION").bold(),
            Line::raw("pro drum machine / 001").italic(),
        ]))
        .centered()
        .render(self.regions.header, buf);
        // pads
        for (i, rect) in self.regions.pads.into_iter().enumerate() {
            let block = if self.active[i] {
                Block::bordered().reversed()
            } else {
                Block::bordered().bold()
            };
            Paragraph::new(Text::raw(PADS[i].key.to_string()).centered())
                .block(block.padding(Padding::new(0, 0, 1, 0)))
                .render(rect, buf);
        }
        // display readout
        Paragraph::new(Text::raw(self.display.as_str()).centered())
            .block(Block::bordered().title(" display "))
            .render(self.regions.display, buf);
        // power toggle
        let power = if self.power {
            Line::raw("power [on]").bold()
        } else {
            Line::raw("power [off]").dim()
        };
        Paragraph::new(power)
            .centered()
            .block(Block::bordered())
            .render(self.regions.power, buf);
        // volume slider
        Gauge::default()
            .ratio(self.volume as f64)
            .label(format!("{}%", (self.volume * 100.).round() as u8))
            .block(Block::bordered().title(" master volume "))
            .render(self.regions.slider, buf);
    }
}

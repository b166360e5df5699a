use std::io::Write;

use crate::game::GameEvent;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sound {
    Click,
    Landed,
    FullLine,
    PauseClick,
}

impl Sound {
    /// The notification a simulation event calls for, if any.
    pub fn for_event(event: &GameEvent) -> Option<Sound> {
        match event {
            GameEvent::PieceLanded => Some(Sound::Landed),
            GameEvent::LinesCleared(_) => Some(Sound::FullLine),
            GameEvent::Paused | GameEvent::Unpaused => Some(Sound::PauseClick),
            _ => None,
        }
    }
}

/// Fire-and-forget playback.
pub trait AudioSink {
    fn play(&mut self, sound: Sound);
}

pub struct Silent;

impl AudioSink for Silent {
    fn play(&mut self, _sound: Sound) {}
}

/// Rings the terminal bell for the sounds worth hearing over a keyboard.
pub struct TerminalBell<W: Write> {
    out: W,
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> AudioSink for TerminalBell<W> {
    fn play(&mut self, sound: Sound) {
        if matches!(sound, Sound::Landed | Sound::FullLine) {
            let _ = self.out.write_all(b"\x07");
            let _ = self.out.flush();
        }
    }
}

/// Records what was played, in order.
#[derive(Default)]
pub struct Recorder {
    pub played: Vec<Sound>,
}

impl AudioSink for Recorder {
    fn play(&mut self, sound: Sound) {
        self.played.push(sound);
    }
}

pub fn play_events(sink: &mut dyn AudioSink, events: &[GameEvent]) {
    for sound in events.iter().filter_map(Sound::for_event) {
        sink.play(sound);
    }
}

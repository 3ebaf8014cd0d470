use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::{resolve_key, InputEvent, Key, KeyMode};

/// Everything a display needs to draw one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    pub title: String,
    /// Image of the frame under the cursor, if any.
    pub frame: Option<PathBuf>,
    pub lines: Vec<String>,
}

/// What a screen wants after handling one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Leave this screen and return to the caller.
    Exit,
    /// Leave the application.
    Quit,
}

/// A screen the driver can run: the wizard, the recorder or a workbench.
pub trait Screen {
    fn key_mode(&self) -> KeyMode;

    /// One tick; `event` is `None` when no key arrived within the tick.
    fn step(&mut self, event: Option<InputEvent>) -> Flow;

    fn view(&self) -> View;
}

pub trait EventSource {
    /// Waits up to `timeout` for a key press.
    fn poll(&mut self, timeout: Duration) -> io::Result<Option<Key>>;
}

pub trait DisplaySink {
    fn show(&mut self, view: &View) -> io::Result<()>;
}

/// Runs `screen` until it exits: draw, poll one tick, step.
pub fn drive(
    screen: &mut dyn Screen,
    events: &mut dyn EventSource,
    display: &mut dyn DisplaySink,
    tick: Duration,
) -> io::Result<Flow> {
    loop {
        display.show(&screen.view())?;
        let event = events
            .poll(tick)?
            .and_then(|key| resolve_key(screen.key_mode(), key));
        match screen.step(event) {
            Flow::Continue => {}
            done => return Ok(done),
        }
    }
}

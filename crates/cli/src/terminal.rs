use anyhow::{Context, Result};
use assets::AssetRepository;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use editor::{
    drive, strategy_for, DirectorySource, DisplaySink, EditorConfig, EventSource, Flow,
    FrameSource, Key, Recorder, View, Workbench, WorkflowWizard,
};
use image::DynamicImage;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

/// Wizard, then the chosen editor, until the user quits.
pub fn run_interactive(
    config: &EditorConfig,
    repo: &AssetRepository,
    capture: Option<&Path>,
) -> Result<()> {
    let _guard = TerminalGuard::enter()?;
    let mut events = KeyEvents;
    let mut display = TerminalDisplay::default();
    let tick = config.tick();
    let mut wizard = WorkflowWizard::new();

    loop {
        if drive(&mut wizard, &mut events, &mut display, tick)? == Flow::Quit {
            break;
        }
        let Some(selection) = wizard.take_selection() else {
            continue;
        };
        let flow = match strategy_for(selection.editor, config) {
            Some(strategy) => {
                let mut bench = Workbench::open(repo.clone(), selection.stage, strategy)?;
                drive(&mut bench, &mut events, &mut display, tick)?
            }
            None => {
                let mut recorder = Recorder::new(repo.clone(), capture_source(capture)?);
                drive(&mut recorder, &mut events, &mut display, tick)?
            }
        };
        if flow == Flow::Quit {
            break;
        }
    }
    info!("leaving interactive mode");
    Ok(())
}

fn capture_source(capture: Option<&Path>) -> Result<Box<dyn FrameSource>> {
    match capture {
        Some(dir) => {
            let source = DirectorySource::open(dir)
                .with_context(|| format!("cannot read frames from {}", dir.display()))?;
            Ok(Box::new(source))
        }
        None => Ok(Box::new(NoCamera)),
    }
}

/// Recorder source when no `--capture` directory was given.
struct NoCamera;

impl FrameSource for NoCamera {
    fn next_frame(&mut self) -> io::Result<Option<DynamicImage>> {
        Ok(None)
    }
}

/// Raw mode plus alternate screen, restored on drop.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)
            .context("failed entering alternate screen")?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        disable_raw_mode().ok();
        execute!(io::stdout(), Show, LeaveAlternateScreen).ok();
    }
}

struct KeyEvents;

impl EventSource for KeyEvents {
    /// Always takes the full tick so playback speed does not depend on typing.
    fn poll(&mut self, timeout: Duration) -> io::Result<Option<Key>> {
        let started = Instant::now();
        let mut pressed = None;
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    pressed = map_key(key);
                }
            }
        }
        if let Some(rest) = timeout.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
        Ok(pressed)
    }
}

fn map_key(key: KeyEvent) -> Option<Key> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Key::Char('q'));
    }
    match key.code {
        KeyCode::Char(c) => Some(Key::Char(c)),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Esc),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        _ => None,
    }
}

/// Plain-text rendering; redraws only when the view changed.
#[derive(Default)]
struct TerminalDisplay {
    last: Option<View>,
}

impl DisplaySink for TerminalDisplay {
    fn show(&mut self, view: &View) -> io::Result<()> {
        if self.last.as_ref() == Some(view) {
            return Ok(());
        }
        let mut out = io::stdout().lock();
        queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
        queue!(out, Print(&view.title), Print("\r\n\r\n"))?;
        if let Some(frame) = &view.frame {
            queue!(out, Print(format!("[{}]\r\n\r\n", frame.display())))?;
        }
        for line in &view.lines {
            queue!(out, Print(line), Print("\r\n"))?;
        }
        out.flush()?;
        self.last = Some(view.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        let press = |code| KeyEvent::new(code, KeyModifiers::NONE);

        assert_eq!(map_key(press(KeyCode::Char('a'))), Some(Key::Char('a')));
        assert_eq!(map_key(press(KeyCode::Enter)), Some(Key::Enter));
        assert_eq!(map_key(press(KeyCode::F(1))), None);
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Key::Char('q'))
        );
    }
}

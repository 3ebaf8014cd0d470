use crate::EditorKind;

/// Abstract editor and wizard commands, independent of any input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    Quit,
    Up,
    Down,
    Confirm,
    Back,
    AddCurrent,
    RemoveCurrent,
    PrepareUpload,
    ProjectLabels,
    TrimBefore,
    TrimAfter,
    Split,
    Approve,
    Reject,
    StartRecording,
    StopRecording,
    PreviousAsset,
    NextAsset,
    PreviousFrame,
    NextFrame,
    TogglePause,
    Reset,
}

impl InputEvent {
    /// Cursor and playback events every editor handles the same way.
    pub fn is_navigation(self) -> bool {
        matches!(
            self,
            InputEvent::PreviousAsset
                | InputEvent::NextAsset
                | InputEvent::PreviousFrame
                | InputEvent::NextFrame
                | InputEvent::TogglePause
                | InputEvent::Reset
        )
    }
}

/// A key press as reported by the terminal, reduced to what the keymap reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Esc,
    Up,
    Down,
    Left,
    Right,
}

/// Which keymap applies to the screen currently driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    Wizard,
    Editor(EditorKind),
}

/// Maps a key to an event under `mode`. Letter keys are case-insensitive.
/// Editor-specific bindings shadow the shared ones, so `s` splits in the
/// frame editor but has no shared meaning elsewhere.
pub fn resolve_key(mode: KeyMode, key: Key) -> Option<InputEvent> {
    let key = match key {
        Key::Char(c) => Key::Char(c.to_ascii_lowercase()),
        other => other,
    };
    match mode {
        KeyMode::Wizard => wizard_key(key),
        KeyMode::Editor(EditorKind::Recorder) => recorder_key(key),
        KeyMode::Editor(kind) => editor_key(kind, key).or_else(|| shared_key(key)),
    }
}

fn wizard_key(key: Key) -> Option<InputEvent> {
    match key {
        Key::Char('w') | Key::Up => Some(InputEvent::Up),
        Key::Char('s') | Key::Down => Some(InputEvent::Down),
        Key::Enter => Some(InputEvent::Confirm),
        Key::Esc => Some(InputEvent::Back),
        Key::Char('q') => Some(InputEvent::Quit),
        _ => None,
    }
}

fn recorder_key(key: Key) -> Option<InputEvent> {
    match key {
        Key::Char('r') => Some(InputEvent::StartRecording),
        Key::Char('s') => Some(InputEvent::StopRecording),
        Key::Char('q') => Some(InputEvent::Quit),
        Key::Esc => Some(InputEvent::Back),
        _ => None,
    }
}

fn editor_key(kind: EditorKind, key: Key) -> Option<InputEvent> {
    let Key::Char(c) = key else {
        return None;
    };
    match (kind, c) {
        (EditorKind::Keyframes, 'a') => Some(InputEvent::AddCurrent),
        (EditorKind::Keyframes, 'd') => Some(InputEvent::RemoveCurrent),
        (EditorKind::Keyframes, 'u') => Some(InputEvent::PrepareUpload),
        (EditorKind::Keyframes, 'l') => Some(InputEvent::ProjectLabels),
        (EditorKind::Frames, 'd') => Some(InputEvent::TrimBefore),
        (EditorKind::Frames, 'f') => Some(InputEvent::TrimAfter),
        (EditorKind::Frames, 's') => Some(InputEvent::Split),
        (EditorKind::Auditer, 'a') => Some(InputEvent::Approve),
        (EditorKind::Auditer, 'd') => Some(InputEvent::Reject),
        _ => None,
    }
}

fn shared_key(key: Key) -> Option<InputEvent> {
    match key {
        Key::Char('q') => Some(InputEvent::Quit),
        Key::Esc => Some(InputEvent::Back),
        Key::Char('r') => Some(InputEvent::Reset),
        Key::Char('p') => Some(InputEvent::TogglePause),
        Key::Char('b') | Key::Left => Some(InputEvent::PreviousFrame),
        Key::Char('n') | Key::Right => Some(InputEvent::NextFrame),
        Key::Char('i') | Key::Up => Some(InputEvent::PreviousAsset),
        Key::Char('o') | Key::Down => Some(InputEvent::NextAsset),
        _ => None,
    }
}

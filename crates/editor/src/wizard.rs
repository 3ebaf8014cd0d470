use assets::Stage;
use tracing::info;

use crate::{EditorKind, Flow, InputEvent, KeyMode, Screen, View};

const INSTRUCTIONS: &str = "Use W and S to navigate, and Enter to proceed.";
const PROCEED: &str = "Proceed";
const BACK: &str = "Back";
const QUIT: &str = "Quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Editor,
    Stage,
    Confirm,
}

/// The wizard's product: which editor to run over which stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub editor: EditorKind,
    pub stage: Stage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardOutcome {
    Pending,
    Launch(Selection),
    Quit,
}

/// Three-step menu: editor, then stage (skipped for the recorder), then
/// confirmation. Every step lists its own choices followed by `Back` and
/// `Quit`; the cursor wraps around and restarts at 0 whenever a step is
/// entered.
#[derive(Debug, Clone)]
pub struct WorkflowWizard {
    step: WizardStep,
    cursor: usize,
    editor: EditorKind,
    stage: Stage,
    launched: Option<Selection>,
}

impl Default for WorkflowWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowWizard {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Editor,
            cursor: 0,
            editor: EditorKind::Recorder,
            stage: Stage::New,
            launched: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Labels of the current step, fixed choices included.
    pub fn options(&self) -> Vec<&'static str> {
        let mut options: Vec<&'static str> = match self.step {
            WizardStep::Editor => EditorKind::ALL.iter().map(|k| k.label()).collect(),
            WizardStep::Stage => Stage::ALL.iter().map(|s| s.dir_name()).collect(),
            WizardStep::Confirm => vec![PROCEED],
        };
        options.extend([BACK, QUIT]);
        options
    }

    /// Selection that launched most recently; cleared by taking it.
    pub fn take_selection(&mut self) -> Option<Selection> {
        self.launched.take()
    }

    pub fn handle(&mut self, event: InputEvent) -> WizardOutcome {
        let count = self.choice_count() + 2;
        match event {
            InputEvent::Up => self.cursor = (self.cursor + count - 1) % count,
            InputEvent::Down => self.cursor = (self.cursor + 1) % count,
            InputEvent::Back => self.back(),
            InputEvent::Quit => return WizardOutcome::Quit,
            InputEvent::Confirm => return self.confirm(),
            _ => {}
        }
        WizardOutcome::Pending
    }

    fn choice_count(&self) -> usize {
        match self.step {
            WizardStep::Editor => EditorKind::ALL.len(),
            WizardStep::Stage => Stage::ALL.len(),
            WizardStep::Confirm => 1,
        }
    }

    fn confirm(&mut self) -> WizardOutcome {
        let choices = self.choice_count();
        if self.cursor == choices {
            self.back();
            return WizardOutcome::Pending;
        }
        if self.cursor == choices + 1 {
            return WizardOutcome::Quit;
        }
        match self.step {
            WizardStep::Editor => {
                self.editor = EditorKind::ALL[self.cursor];
                if self.editor.needs_stage() {
                    self.enter(WizardStep::Stage);
                } else {
                    self.stage = Stage::New;
                    self.enter(WizardStep::Confirm);
                }
            }
            WizardStep::Stage => {
                self.stage = Stage::ALL[self.cursor];
                self.enter(WizardStep::Confirm);
            }
            WizardStep::Confirm => {
                let selection = Selection {
                    editor: self.editor,
                    stage: self.stage,
                };
                info!(editor = %selection.editor, stage = %selection.stage, "launching editor");
                // returning from the editor starts a fresh choice
                self.enter(WizardStep::Editor);
                return WizardOutcome::Launch(selection);
            }
        }
        WizardOutcome::Pending
    }

    fn back(&mut self) {
        let previous = match self.step {
            WizardStep::Editor | WizardStep::Stage => WizardStep::Editor,
            WizardStep::Confirm if self.editor.needs_stage() => WizardStep::Stage,
            WizardStep::Confirm => WizardStep::Editor,
        };
        self.enter(previous);
    }

    fn enter(&mut self, step: WizardStep) {
        self.step = step;
        self.cursor = 0;
    }
}

impl Screen for WorkflowWizard {
    fn key_mode(&self) -> KeyMode {
        KeyMode::Wizard
    }

    fn step(&mut self, event: Option<InputEvent>) -> Flow {
        let Some(event) = event else {
            return Flow::Continue;
        };
        match self.handle(event) {
            WizardOutcome::Pending => Flow::Continue,
            WizardOutcome::Launch(selection) => {
                self.launched = Some(selection);
                Flow::Exit
            }
            WizardOutcome::Quit => Flow::Quit,
        }
    }

    fn view(&self) -> View {
        let mut lines = vec![INSTRUCTIONS.to_string(), String::new()];
        if self.step == WizardStep::Confirm {
            lines.push("Your choices".to_string());
            lines.push(format!("    Stage: {}", self.stage));
            lines.push(format!("    Editor: {}", self.editor));
            lines.push(String::new());
        }
        let choices = self.choice_count();
        for (i, option) in self.options().into_iter().enumerate() {
            if i == choices {
                lines.push(String::new());
            }
            let marker = if i == self.cursor { "> " } else { "  " };
            lines.push(format!("{marker}{option}"));
        }
        View {
            title: "Options Menu".to_string(),
            frame: None,
            lines,
        }
    }
}

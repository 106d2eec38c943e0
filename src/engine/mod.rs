mod events;
mod input;
mod options;
mod runner;
mod state;
mod steps;
mod terminal;
mod typing;

pub use events::EngineEvent;
pub use input::{OperatorInput, ScriptedInput, StdinInput};
pub use options::{DEFAULT_SHELL, Options};
pub use runner::{Hook, Run};
pub use state::{RunSummary, StepPhase};
pub use steps::Step;
pub use terminal::{CURSOR_UP, CaptureBuffer, Terminal};
pub use typing::{MAX_KEYSTROKE_DELAY, Typewriter};

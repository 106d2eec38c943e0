use super::events::{EngineEvent, emit};
use super::input::{OperatorInput, StdinInput};
use super::options::{DEFAULT_SHELL, Options};
use super::state::RunSummary;
use super::steps::{Step, StepContext};
use super::terminal::Terminal;
use super::typing::Typewriter;
use crate::error::{RunError, RunResult};
use crate::theme::Palette;
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Run 전후에 실행되는 인자 없는 훅이다.
pub type Hook = Box<dyn FnMut() -> anyhow::Result<()> + Send>;

fn noop() -> anyhow::Result<()> {
    Ok(())
}

/// 하나의 제목 아래 순서대로 실행되는 Step 묶음이다.
pub struct Run {
    /// 제목.
    title: String,
    /// 제목 아래 출력할 설명 줄.
    description: Vec<String>,
    /// 실행 순서대로 정렬된 Step 목록.
    steps: Vec<Step>,
    /// 실행 옵션.
    options: Options,
    /// 출력 대상.
    terminal: Terminal,
    /// 운영자 입력.
    input: Box<dyn OperatorInput>,
    /// 색상 팔레트.
    palette: Palette,
    /// 이벤트 송신자.
    events: Option<UnboundedSender<EngineEvent>>,
    /// Step 실행 전 훅.
    setup: Hook,
    /// 모든 Step 성공 후 훅.
    cleanup: Hook,
    /// 마지막 실행 결과 요약.
    summary: RunSummary,
}

impl fmt::Debug for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Run")
            .field("title", &self.title)
            .field("description", &self.description)
            .field("steps", &self.steps)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Run {
    /// 빈 Step 목록과 기본 옵션, 표준 출력/입력으로 Run을 생성한다.
    pub fn new<D>(title: impl Into<String>, description: D) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            title: title.into(),
            description: description.into_iter().map(Into::into).collect(),
            steps: Vec::new(),
            options: Options::default(),
            terminal: Terminal::stdout(),
            input: Box::new(StdinInput::new()),
            palette: Palette::default(),
            events: None,
            setup: Box::new(noop),
            cleanup: Box::new(noop),
            summary: RunSummary::default(),
        }
    }

    /// 설명과 명령으로 Step을 추가한다. 내용은 검증하지 않는다.
    pub fn step<D, C>(&mut self, description: D, command: C)
    where
        D: IntoIterator,
        D::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        self.steps.push(Step::new(description, command));
    }

    /// 미리 구성한 Step을 추가한다.
    pub fn push_step(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    /// 출력 대상을 교체한다.
    pub fn set_output(&mut self, terminal: Terminal) {
        self.terminal = terminal;
    }

    /// 운영자 입력을 교체한다.
    pub fn set_input(&mut self, input: impl OperatorInput + 'static) {
        self.input = Box::new(input);
    }

    /// 실행 이벤트를 받을 채널을 연결한다.
    pub fn set_events(&mut self, sender: UnboundedSender<EngineEvent>) {
        self.events = Some(sender);
    }

    pub fn set_setup(&mut self, setup: impl FnMut() -> anyhow::Result<()> + Send + 'static) {
        self.setup = Box::new(setup);
    }

    pub fn set_cleanup(&mut self, cleanup: impl FnMut() -> anyhow::Result<()> + Send + 'static) {
        self.cleanup = Box::new(cleanup);
    }

    /// 마지막 실행의 Step별 결과를 반환한다.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Run 전체를 실행한다.
    ///
    /// setup 실패 시 어떤 Step도 실행하지 않는다. 첫 번째 복구 불가능한 오류에서
    /// 즉시 중단하며 이 경우 cleanup은 실행하지 않는다. `continue_on_error`가 켜져
    /// 있으면 명령 실패를 기록하고 계속 진행한 뒤 cleanup 후 실패 목록을 반환한다.
    pub async fn run(&mut self, cancel: CancellationToken) -> RunResult<()> {
        if self.options.shell.is_empty() {
            self.options.shell = DEFAULT_SHELL.to_string();
        }
        self.summary = RunSummary::default();
        let total = self.steps.len();
        tracing::info!(title = %self.title, total, "Run 시작");

        if let Err(err) = (self.setup)() {
            tracing::error!(title = %self.title, error = %err, "setup 실패");
            emit(self.events.as_ref(), EngineEvent::RunFinished { success: false });
            return Err(RunError::Setup(err));
        }
        emit(
            self.events.as_ref(),
            EngineEvent::RunStarted {
                title: self.title.clone(),
                total,
            },
        );

        let result = match self.print_title_and_description(&cancel).await {
            Ok(()) => self.run_steps(&cancel).await,
            Err(err) => Err(err),
        };
        let result = match result {
            Ok(()) => (self.cleanup)().map_err(RunError::Cleanup),
            Err(err @ RunError::StepsFailed { .. }) => {
                if let Err(cleanup_err) = (self.cleanup)() {
                    tracing::warn!(error = %cleanup_err, "cleanup 실패");
                }
                Err(err)
            }
            Err(err) => Err(err),
        };

        match &result {
            Ok(()) => tracing::info!(title = %self.title, "Run 완료"),
            Err(err) => tracing::error!(title = %self.title, error = %err, "Run 실패"),
        }
        emit(
            self.events.as_ref(),
            EngineEvent::RunFinished {
                success: result.is_ok(),
            },
        );
        result
    }

    async fn run_steps(&mut self, cancel: &CancellationToken) -> RunResult<()> {
        let total = self.steps.len();
        let mut ctx = StepContext {
            options: &self.options,
            terminal: &self.terminal,
            input: self.input.as_mut(),
            typewriter: Typewriter::from_options(&self.options),
            palette: &self.palette,
            cancel,
            events: self.events.as_ref(),
        };
        for (offset, step) in self.steps.iter().enumerate() {
            let index = offset + 1;
            if cancel.is_cancelled() {
                return Err(RunError::Cancelled);
            }
            if offset < ctx.options.skip_steps {
                tracing::debug!(step = index, "skip_steps에 의해 건너뜀");
                self.summary.skipped.push(index);
                emit(ctx.events, EngineEvent::StepSkipped { index });
                continue;
            }

            tracing::info!(step = index, total, "Step 시작");
            emit(ctx.events, EngineEvent::StepStarted { index, total });
            let outcome = step.run(index, total, &mut ctx).await;
            emit(
                ctx.events,
                EngineEvent::StepFinished {
                    index,
                    success: outcome.is_ok(),
                },
            );
            match outcome {
                Ok(()) => self.summary.succeeded.push(index),
                Err(err) => {
                    self.summary.failed.push(index);
                    if ctx.options.continue_on_error && err.is_step_failure() {
                        tracing::warn!(step = index, error = %err, "Step 실패, 다음 Step을 계속 실행합니다.");
                        continue;
                    }
                    return Err(err);
                }
            }
        }
        if self.summary.failed.is_empty() {
            Ok(())
        } else {
            Err(RunError::StepsFailed {
                steps: self.summary.failed.clone(),
            })
        }
    }

    /// 제목과 같은 글자 수의 `=` 밑줄, 그리고 설명 줄을 출력한다.
    async fn print_title_and_description(&mut self, cancel: &CancellationToken) -> RunResult<()> {
        let color = self.palette.pick(self.options.no_color, |p| p.title);
        let paint = |text: &str| match color {
            Some(color) => color.paint(text),
            None => text.to_string(),
        };
        let underline = "=".repeat(self.title.chars().count());
        self.terminal
            .write(&format!("{}\n{}\n", paint(&self.title), paint(&underline)))
            .await?;
        let color = self.palette.pick(self.options.no_color, |p| p.description);
        let typewriter = Typewriter::from_options(&self.options);
        for line in &self.description {
            typewriter
                .type_line(&self.terminal, color, line, cancel)
                .await?;
        }
        Ok(())
    }
}

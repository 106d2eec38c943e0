use super::events::{EngineEvent, emit};
use super::input::OperatorInput;
use super::options::Options;
use super::state::StepPhase;
use super::terminal::Terminal;
use super::typing::Typewriter;
use crate::error::RunResult;
use crate::theme::Palette;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

mod confirm;
mod shell;
mod utils;

use confirm::{breakpoint_wait, wait_or_sleep};
use shell::run_shell_command;

/// Step 실행 중 공유되는 읽기 전용 정책과 입출력 핸들이다.
///
/// Run이 소유한 옵션을 Step이 역참조하지 않도록 실행 시점에 명시적으로 전달한다.
pub(crate) struct StepContext<'a> {
    /// Run 실행 옵션.
    pub(crate) options: &'a Options,
    /// 출력 대상.
    pub(crate) terminal: &'a Terminal,
    /// 운영자 입력.
    pub(crate) input: &'a mut dyn OperatorInput,
    /// 글자 출력 전략.
    pub(crate) typewriter: Typewriter,
    /// 색상 팔레트.
    pub(crate) palette: &'a Palette,
    /// 취소 토큰.
    pub(crate) cancel: &'a CancellationToken,
    /// 이벤트 송신자.
    pub(crate) events: Option<&'a UnboundedSender<EngineEvent>>,
}

impl StepContext<'_> {
    /// 단계 전이를 기록하고 관찰자에게 알린다.
    pub(crate) fn phase(&self, index: usize, phase: StepPhase) {
        tracing::debug!(step = index, %phase, "Step 단계 전이");
        emit(self.events, EngineEvent::StepPhase { index, phase });
    }
}

/// Step은 Run 내 최소 실행 단위를 표현한다.
///
/// 여러 줄 설명과 선택적인 셸 명령으로 구성되며 생성 이후 변경되지 않는다.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Step {
    /// 설명 줄 목록. 마지막 줄에 진행 표시가 붙는다.
    description: Vec<String>,
    /// 공백으로 이어 붙여 실행할 명령 토큰.
    command: Vec<String>,
    /// 명령 실패를 무시할지 여부.
    can_fail: bool,
    /// 수동 정지 지점인지 여부.
    breakpoint: bool,
}

impl Step {
    /// 설명 줄과 명령 토큰으로 Step을 생성한다. 명령이 비어 있으면 설명만 출력한다.
    pub fn new<D, C>(description: D, command: C) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            description: description.into_iter().map(Into::into).collect(),
            command: command.into_iter().map(Into::into).collect(),
            can_fail: false,
            breakpoint: false,
        }
    }

    /// 명령 실패를 무시하도록 설정한다.
    pub fn with_can_fail(mut self, can_fail: bool) -> Self {
        self.can_fail = can_fail;
        self
    }

    /// breakpoint 여부를 설정한다.
    pub fn with_breakpoint(mut self, breakpoint: bool) -> Self {
        self.breakpoint = breakpoint;
        self
    }

    pub fn description(&self) -> &[String] {
        &self.description
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn can_fail(&self) -> bool {
        self.can_fail
    }

    pub fn is_breakpoint(&self) -> bool {
        self.breakpoint
    }

    /// 셸에 전달할 한 줄 명령을 만든다.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }

    /// 오류 메시지에 사용할 Step 식별 문자열을 만든다.
    pub(crate) fn label(&self, current: usize, total: usize) -> String {
        let headline = self
            .description
            .first()
            .cloned()
            .unwrap_or_else(|| self.command_line());
        format!("[{current}/{total}] {headline}")
    }

    /// Step을 실행한다. `current`는 1 기반 위치이다.
    pub(crate) async fn run(
        &self,
        current: usize,
        total: usize,
        ctx: &mut StepContext<'_>,
    ) -> RunResult<()> {
        let label = self.label(current, total);
        ctx.phase(current, StepPhase::Pending);
        wait_or_sleep(ctx, &label).await?;
        ctx.phase(current, StepPhase::Paced);

        if !self.description.is_empty() && !ctx.options.hide_descriptions {
            self.echo(current, total, ctx).await?;
            ctx.phase(current, StepPhase::DescriptionPrinted);
        }
        if self.breakpoint && ctx.options.breakpoint {
            breakpoint_wait(ctx, &label).await?;
            ctx.phase(current, StepPhase::BreakpointPassed);
        }
        if self.command.is_empty() {
            ctx.phase(current, StepPhase::NoCommand);
        } else {
            run_shell_command(self, current, &label, ctx).await?;
        }
        ctx.phase(current, StepPhase::Done);
        Ok(())
    }

    /// 설명을 출력한다. 마지막 줄에는 `[current/total]`과 명령 여부에 따른 콜론이 붙는다.
    async fn echo(&self, current: usize, total: usize, ctx: &StepContext<'_>) -> RunResult<()> {
        let color = ctx.palette.pick(ctx.options.no_color, |p| p.description);
        let last = self.description.len() - 1;
        for (i, line) in self.description.iter().enumerate() {
            if i == last {
                // 명령이 없는 Step은 콜론을 붙이지 않는다
                let colon = if self.command.is_empty() { "" } else { ":" };
                let text = format!("# {line} [{current}/{total}]{colon}");
                ctx.typewriter
                    .type_line(ctx.terminal, color, &text, ctx.cancel)
                    .await?;
                ctx.terminal.write("\n").await?;
            } else {
                ctx.typewriter
                    .type_line(ctx.terminal, color, &format!("# {line}"), ctx.cancel)
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::input::ScriptedInput;
    use crate::engine::terminal::CaptureBuffer;
    use crate::error::RunError;

    /// 테스트용 Step 실행 환경을 묶는다.
    pub(crate) struct Harness {
        pub(crate) options: Options,
        pub(crate) terminal: Terminal,
        pub(crate) buffer: CaptureBuffer,
        pub(crate) input: ScriptedInput,
        pub(crate) palette: Palette,
        pub(crate) cancel: CancellationToken,
    }

    impl Harness {
        /// auto, immediate, no_color가 켜진 `sh` 기반 환경을 만든다.
        pub(crate) fn new() -> Self {
            let (terminal, buffer) = Terminal::capture();
            Self {
                options: Options {
                    auto: true,
                    immediate: true,
                    no_color: true,
                    shell: "sh".into(),
                    ..Options::default()
                },
                terminal,
                buffer,
                input: ScriptedInput::default(),
                palette: Palette::default(),
                cancel: CancellationToken::new(),
            }
        }

        pub(crate) async fn run(&mut self, step: &Step, current: usize, total: usize) -> RunResult<()> {
            let mut ctx = StepContext {
                options: &self.options,
                terminal: &self.terminal,
                input: &mut self.input,
                typewriter: Typewriter::from_options(&self.options),
                palette: &self.palette,
                cancel: &self.cancel,
                events: None,
            };
            step.run(current, total, &mut ctx).await
        }
    }

    #[test]
    fn command_tokens_are_joined_with_spaces() {
        let step = Step::new(["greet"], ["echo", "hi"]);
        assert_eq!(step.command_line(), "echo hi");
        assert_eq!(step.label(1, 3), "[1/3] greet");
        assert_eq!(Step::new(Vec::<String>::new(), ["true"]).label(2, 2), "[2/2] true");
    }

    #[tokio::test]
    async fn description_lines_get_prefix_and_progress_marker() {
        let mut harness = Harness::new();
        let step = Step::new(["first", "second"], ["true"]);
        harness.run(&step, 1, 2).await.expect("Step 실패");
        let out = harness.buffer.contents();
        assert!(out.starts_with("# first\n# second [1/2]:\n\n"), "{out}");
        assert!(out.contains("> true\n"), "{out}");
    }

    #[tokio::test]
    async fn description_without_command_has_no_colon() {
        let mut harness = Harness::new();
        let step = Step::new(["only text"], Vec::<String>::new());
        harness.run(&step, 2, 2).await.expect("Step 실패");
        assert_eq!(harness.buffer.contents(), "# only text [2/2]\n\n");
    }

    #[tokio::test]
    async fn hidden_descriptions_print_only_the_command() {
        let mut harness = Harness::new();
        harness.options.hide_descriptions = true;
        harness.options.dry_run = true;
        let step = Step::new(["secret"], ["echo", "x"]);
        harness.run(&step, 1, 1).await.expect("Step 실패");
        assert_eq!(harness.buffer.contents(), "> echo \\\n    x\n");
    }

    #[tokio::test]
    async fn colored_description_uses_palette() {
        let mut harness = Harness::new();
        harness.options.no_color = false;
        let step = Step::new(["hello"], Vec::<String>::new());
        harness.run(&step, 1, 1).await.expect("Step 실패");
        assert_eq!(
            harness.buffer.contents(),
            "\x1b[90m# hello [1/1]\x1b[0m\n\n"
        );
    }

    #[tokio::test]
    async fn interactive_pause_reads_input_and_moves_cursor_up() {
        let mut harness = Harness::new();
        harness.options.auto = false;
        harness.input = ScriptedInput::new([""]);
        let step = Step::new(["paused"], Vec::<String>::new());
        harness.run(&step, 1, 1).await.expect("Step 실패");
        assert_eq!(harness.input.remaining(), 0);
        assert_eq!(harness.buffer.contents(), "…\x1b[1A# paused [1/1]\n\n");
    }

    #[tokio::test]
    async fn interactive_command_step_pauses_twice() {
        let mut harness = Harness::new();
        harness.options.auto = false;
        harness.input = ScriptedInput::new(["", ""]);
        let step = Step::new(["greet"], ["echo", "hi"]);
        harness.run(&step, 1, 1).await.expect("Step 실패");
        assert_eq!(harness.input.remaining(), 0);
        assert_eq!(
            harness.buffer.contents(),
            "…\x1b[1A# greet [1/1]:\n\n> echo \\\n    hi\n…\x1b[1Ahi\n\n"
        );
    }

    #[tokio::test]
    async fn closed_input_fails_with_step_identity() {
        let mut harness = Harness::new();
        harness.options.auto = false;
        let step = Step::new(["needs input"], ["true"]);
        let err = harness.run(&step, 3, 4).await.expect_err("입력이 없으면 실패해야 합니다.");
        match err {
            RunError::Input { step, .. } => assert_eq!(step, "[3/4] needs input"),
            other => panic!("예상하지 못한 오류: {other}"),
        }
    }

    #[tokio::test]
    async fn breakpoint_waits_only_when_enabled() {
        let mut harness = Harness::new();
        let step = Step::new(["stop here"], Vec::<String>::new()).with_breakpoint(true);
        harness.run(&step, 1, 1).await.expect("Step 실패");
        assert!(!harness.buffer.contents().contains("bp"));

        let mut harness = Harness::new();
        harness.options.breakpoint = true;
        harness.input = ScriptedInput::new([""]);
        harness.run(&step, 1, 1).await.expect("Step 실패");
        assert_eq!(
            harness.buffer.contents(),
            "# stop here [1/1]\n\nbp\x1b[1A"
        );
    }

    #[tokio::test]
    async fn breakpoint_still_runs_its_command() {
        let mut harness = Harness::new();
        harness.options.breakpoint = true;
        harness.input = ScriptedInput::new([""]);
        let step = Step::new(["gate"], ["echo", "after-gate"]).with_breakpoint(true);
        harness.run(&step, 1, 1).await.expect("Step 실패");
        assert!(harness.buffer.contents().contains("after-gate\n"));
    }
}

use super::utils::forward_optional;
use super::{Step, StepContext};
use super::confirm::wait_or_sleep;
use crate::engine::state::StepPhase;
use crate::error::{RunError, RunResult};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// 셸 종료 후 출력 파이프를 마저 비우는 최대 시간.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Step 명령을 출력하고, dry-run이 아니면 셸로 실행한다.
pub(super) async fn run_shell_command(
    step: &Step,
    current: usize,
    label: &str,
    ctx: &mut StepContext<'_>,
) -> RunResult<()> {
    let command_line = step.command_line();
    let color = ctx.palette.pick(ctx.options.no_color, |p| p.command);
    let display = format!("> {}", step.command().join(" \\\n    "));
    ctx.typewriter
        .type_line(ctx.terminal, color, &display, ctx.cancel)
        .await?;
    ctx.phase(current, StepPhase::CommandPrinted);

    wait_or_sleep(ctx, label).await?;
    if ctx.options.dry_run {
        tracing::info!(step = current, command = %command_line, "dry-run: 명령 실행 생략");
        ctx.phase(current, StepPhase::DryRun);
        return Ok(());
    }

    let result = execute(&command_line, label, ctx).await;
    if matches!(result, Err(RunError::Cancelled)) {
        return result;
    }
    ctx.phase(current, StepPhase::CommandRun);
    if step.can_fail() {
        if let Err(err) = result {
            tracing::warn!(step = current, error = %err, "실패 허용 Step, 오류를 무시합니다.");
        }
        return Ok(());
    }
    ctx.terminal.write("\n").await?;
    result
}

/// 셸 프로세스를 실행하고 종료까지 출력을 중계한다. 취소되면 자식 프로세스를 종료한다.
async fn execute(command_line: &str, label: &str, ctx: &StepContext<'_>) -> RunResult<()> {
    let shell = ctx.options.effective_shell();
    let spawn_error = |source| RunError::Spawn {
        step: label.to_string(),
        command: command_line.to_string(),
        source,
    };
    let mut command = Command::new(shell);
    command.arg("-c").arg(command_line);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    command.kill_on_drop(true);
    tracing::debug!(%shell, command = %command_line, "쉘 명령 실행");
    let mut child = command.spawn().map_err(spawn_error)?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let pumps = async {
        tokio::try_join!(
            forward_optional(stdout, ctx.terminal.clone(), "STDOUT"),
            forward_optional(stderr, ctx.terminal.clone(), "STDERR"),
        )
    };
    tokio::pin!(pumps);
    let until_exit = async {
        let mut pumped = None;
        let status = loop {
            tokio::select! {
                status = child.wait() => break status,
                result = &mut pumps, if pumped.is_none() => pumped = Some(result),
            }
        };
        // 셸이 끝난 뒤에는 남은 출력만 잠시 비우고, 파이프를 물려받은 백그라운드 프로세스는 기다리지 않는다
        if pumped.is_none() {
            pumped = tokio::time::timeout(OUTPUT_DRAIN_GRACE, &mut pumps).await.ok();
            if pumped.is_none() {
                tracing::debug!(command = %command_line, "백그라운드 프로세스가 출력 파이프를 유지 중, 중계를 중단합니다.");
            }
        }
        (status, pumped)
    };
    let finished = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => None,
        finished = until_exit => Some(finished),
    };
    let (status, pumped) = match finished {
        Some(finished) => finished,
        None => {
            if let Err(err) = child.kill().await {
                tracing::warn!(error = %err, "취소된 자식 프로세스 종료 실패");
            }
            return Err(RunError::Cancelled);
        }
    };
    if let Some(pumped) = pumped {
        pumped?;
    }
    check_status(status.map_err(spawn_error)?, command_line, label)
}

fn check_status(status: ExitStatus, command_line: &str, label: &str) -> RunResult<()> {
    if status.success() {
        Ok(())
    } else {
        Err(RunError::CommandFailed {
            step: label.to_string(),
            command: command_line.to_string(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::Step;
    use super::super::tests::Harness;
    use crate::error::RunError;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn echo_output_reaches_the_sink() {
        let mut harness = Harness::new();
        let step = Step::new(Vec::<String>::new(), ["echo", "hi"]);
        harness.run(&step, 1, 1).await.expect("Step 실패");
        assert_eq!(harness.buffer.contents(), "> echo \\\n    hi\nhi\n\n");
    }

    #[tokio::test]
    async fn stderr_is_forwarded_too() {
        let mut harness = Harness::new();
        let step = Step::new(Vec::<String>::new(), ["echo oops 1>&2"]);
        harness.run(&step, 1, 1).await.expect("Step 실패");
        assert!(harness.buffer.contents().contains("oops\n"));
    }

    #[tokio::test]
    async fn failing_command_returns_command_failed() {
        let mut harness = Harness::new();
        let step = Step::new(["boom"], ["exit", "3"]);
        let err = harness.run(&step, 2, 5).await.expect_err("실패해야 합니다.");
        match err {
            RunError::CommandFailed { step, command, status } => {
                assert_eq!(step, "[2/5] boom");
                assert_eq!(command, "exit 3");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("예상하지 못한 오류: {other}"),
        }
    }

    #[tokio::test]
    async fn can_fail_swallows_errors_without_trailing_line() {
        let mut harness = Harness::new();
        let step = Step::new(Vec::<String>::new(), ["false"]).with_can_fail(true);
        harness.run(&step, 1, 1).await.expect("실패가 무시되어야 합니다.");
        assert_eq!(harness.buffer.contents(), "> false\n");
    }

    #[tokio::test]
    async fn missing_shell_is_a_spawn_error() {
        let mut harness = Harness::new();
        harness.options.shell = "/nonexistent/shell".into();
        let step = Step::new(Vec::<String>::new(), ["true"]);
        let err = harness.run(&step, 1, 1).await.expect_err("실패해야 합니다.");
        assert!(matches!(err, RunError::Spawn { .. }));
    }

    #[tokio::test]
    async fn dry_run_prints_but_does_not_execute() {
        let dir = tempfile::tempdir().expect("임시 디렉터리 생성 실패");
        let marker = dir.path().join("touched");
        let mut harness = Harness::new();
        harness.options.dry_run = true;
        let step = Step::new(["make file"], ["touch", &*marker.to_string_lossy()]);
        harness.run(&step, 1, 1).await.expect("Step 실패");
        assert!(!marker.exists());
        assert!(harness.buffer.contents().contains("> touch"));
    }

    #[tokio::test]
    async fn background_process_does_not_hold_the_step() {
        let mut harness = Harness::new();
        let step = Step::new(Vec::<String>::new(), ["echo before; sleep 3 &"]);
        let started = Instant::now();
        harness.run(&step, 1, 1).await.expect("Step 실패");
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(harness.buffer.contents().contains("before\n"));
    }

    #[tokio::test]
    async fn cancel_kills_running_child() {
        let mut harness = Harness::new();
        let cancel = harness.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });
        let step = Step::new(Vec::<String>::new(), ["sleep", "30"]);
        let started = Instant::now();
        let err = harness.run(&step, 1, 1).await.expect_err("취소되어야 합니다.");
        assert!(matches!(err, RunError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}

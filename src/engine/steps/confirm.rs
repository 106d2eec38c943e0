use super::StepContext;
use crate::error::{RunError, RunResult};
use std::time::Duration;

/// 입력 대기 중임을 알리는 표시.
const PAUSE_MARKER: &str = "…";
/// breakpoint에서 멈췄음을 알리는 표시.
const BREAKPOINT_MARKER: &str = "bp";

/// auto 모드면 지정 시간만큼 대기하고, 아니면 운영자의 개행 입력을 기다린다.
pub(super) async fn wait_or_sleep(ctx: &mut StepContext<'_>, label: &str) -> RunResult<()> {
    if ctx.options.auto {
        sleep_or_cancel(ctx, ctx.options.auto_timeout).await
    } else {
        prompt(ctx, label, PAUSE_MARKER).await
    }
}

/// breakpoint 표시를 출력하고 운영자 입력을 기다린다.
pub(super) async fn breakpoint_wait(ctx: &mut StepContext<'_>, label: &str) -> RunResult<()> {
    prompt(ctx, label, BREAKPOINT_MARKER).await
}

async fn sleep_or_cancel(ctx: &StepContext<'_>, timeout: Duration) -> RunResult<()> {
    if ctx.cancel.is_cancelled() {
        return Err(RunError::Cancelled);
    }
    if timeout.is_zero() {
        return Ok(());
    }
    tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => Err(RunError::Cancelled),
        _ = tokio::time::sleep(timeout) => Ok(()),
    }
}

async fn prompt(ctx: &mut StepContext<'_>, label: &str, marker: &str) -> RunResult<()> {
    ctx.terminal.write(marker).await?;
    let cancel = ctx.cancel;
    let read = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(RunError::Cancelled),
        read = ctx.input.read_line() => read,
    };
    read.map_err(|source| RunError::Input {
        step: label.to_string(),
        source,
    })?;
    // 입력 표시 줄을 덮어쓰도록 커서를 되돌린다
    ctx.terminal.cursor_up().await
}

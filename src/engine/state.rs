use std::fmt;

/// Step 하나가 거치는 실행 단계를 표현한다.
///
/// `Pending -> Paced -> DescriptionPrinted -> BreakpointPassed -> CommandPrinted
/// -> (CommandRun | DryRun) -> Done` 순서로 진행하며, 명령이 없는 Step은
/// `NoCommand`를 거쳐 종료된다. 설명이 숨겨졌거나 breakpoint가 아니면 해당 단계는 생략된다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    /// 아직 실행 대기 상태.
    Pending,
    /// 대기 시간 또는 입력 대기를 통과했다.
    Paced,
    /// 설명을 출력했다.
    DescriptionPrinted,
    /// breakpoint 입력 대기를 통과했다.
    BreakpointPassed,
    /// 실행할 명령을 출력했다.
    CommandPrinted,
    /// 명령을 실제로 실행했다.
    CommandRun,
    /// dry-run 모드라 명령 실행을 생략했다.
    DryRun,
    /// 실행할 명령이 없다.
    NoCommand,
    /// 정상 종료.
    Done,
}

impl fmt::Display for StepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepPhase::Pending => "pending",
            StepPhase::Paced => "paced",
            StepPhase::DescriptionPrinted => "description-printed",
            StepPhase::BreakpointPassed => "breakpoint-passed",
            StepPhase::CommandPrinted => "command-printed",
            StepPhase::CommandRun => "command-run",
            StepPhase::DryRun => "dry-run",
            StepPhase::NoCommand => "no-command",
            StepPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Run 종료 후 Step별 결과를 요약한다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 정상 종료된 Step 위치(1 기반).
    pub succeeded: Vec<usize>,
    /// 실패한 Step 위치(1 기반).
    pub failed: Vec<usize>,
    /// 건너뛴 Step 위치(1 기반).
    pub skipped: Vec<usize>,
}

impl RunSummary {
    /// 실패한 Step이 없는지 확인한다.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

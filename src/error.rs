use std::process::ExitStatus;

/// Run 실행 중 발생 가능한 오류를 표현한다.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// setup 훅이 실패한 경우이다. 어떤 Step도 실행되지 않는다.
    #[error("setup 실패: {0:#}")]
    Setup(#[source] anyhow::Error),
    /// cleanup 훅이 실패한 경우이다.
    #[error("cleanup 실패: {0:#}")]
    Cleanup(#[source] anyhow::Error),
    /// 운영자 입력(개행)을 읽지 못한 경우이다.
    #[error("Step {step} 입력 대기 실패: {source}")]
    Input {
        /// 실패한 Step 식별 문자열.
        step: String,
        #[source]
        source: std::io::Error,
    },
    /// 출력 대상에 쓰지 못한 경우이다.
    #[error("출력 쓰기 실패: {0}")]
    Write(#[source] std::io::Error),
    /// 셸 프로세스를 생성하지 못한 경우이다.
    #[error("Step {step} 쉘 명령 실행 실패: {command}: {source}")]
    Spawn {
        /// 실패한 Step 식별 문자열.
        step: String,
        /// 실행하려던 명령 문자열.
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// 명령이 비정상 종료한 경우이다.
    #[error("Step {step} 명령 실패 ({status}): {command}")]
    CommandFailed {
        /// 실패한 Step 식별 문자열.
        step: String,
        /// 실행한 명령 문자열.
        command: String,
        /// 종료 상태.
        status: ExitStatus,
    },
    /// 취소 토큰에 의해 실행이 중단된 경우이다.
    #[error("사용자에 의해 실행이 중단되었습니다.")]
    Cancelled,
    /// continue_on_error 모드에서 하나 이상의 Step이 실패한 경우이다.
    #[error("{} 개 Step 실패: {steps:?}", steps.len())]
    StepsFailed {
        /// 실패한 Step의 1 기반 위치 목록.
        steps: Vec<usize>,
    },
}

impl RunError {
    /// continue_on_error 모드에서 건너뛰고 계속 진행할 수 있는 오류인지 판단한다.
    pub fn is_step_failure(&self) -> bool {
        matches!(self, RunError::CommandFailed { .. } | RunError::Spawn { .. })
    }
}

/// 라이브러리 전반에서 사용하는 Result 별칭이다.
pub type RunResult<T> = Result<T, RunError>;

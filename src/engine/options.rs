use std::time::Duration;

/// 셸이 지정되지 않았을 때 사용할 기본 셸 프로그램.
pub const DEFAULT_SHELL: &str = "bash";

/// Run 실행 정책을 담는 옵션 묶음이다.
///
/// Run 실행 전에 한 번 설정되고, 실행 중에는 각 Step에 읽기 전용으로 전달된다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// auto 모드에서 Step 사이에 대기할 시간.
    pub auto_timeout: Duration,
    /// 입력 대기 대신 고정 대기 시간으로 진행할지 여부.
    pub auto: bool,
    /// breakpoint Step에서 멈출지 여부.
    pub breakpoint: bool,
    /// 명령 실패 시에도 다음 Step을 계속 실행할지 여부.
    pub continue_on_error: bool,
    /// Step 설명 출력을 생략할지 여부.
    pub hide_descriptions: bool,
    /// 명령을 출력만 하고 실행하지 않을지 여부.
    pub dry_run: bool,
    /// 색상 없이 출력할지 여부.
    pub no_color: bool,
    /// 타자 효과 없이 즉시 출력할지 여부.
    pub immediate: bool,
    /// 앞에서부터 건너뛸 Step 수.
    pub skip_steps: usize,
    /// 명령 실행에 사용할 셸 프로그램.
    pub shell: String,
}

impl Options {
    /// 실제로 사용할 셸 이름을 반환한다.
    pub fn effective_shell(&self) -> &str {
        if self.shell.is_empty() {
            DEFAULT_SHELL
        } else {
            &self.shell
        }
    }
}

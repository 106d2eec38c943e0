//! 제목이 붙은 Step 목록을 순서대로 보여 주고 각 Step의 셸 명령을 실행하는
//! 가이드형 런북 실행기.
//!
//! [`Run`]에 Step을 추가하고 [`Options`]를 설정한 뒤 [`Run::run`]을 호출한다.
//! 각 Step은 대기(또는 입력 대기) 후 설명을 타자 효과로 출력하고, 명령이 있으면
//! 설정된 셸로 실행하며 출력을 실시간으로 중계한다.

pub mod config;
pub mod engine;
pub mod error;
pub mod scenario;
pub mod theme;

pub use engine::{EngineEvent, Options, Run, Step, Terminal};
pub use error::{RunError, RunResult};

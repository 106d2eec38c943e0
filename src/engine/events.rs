use super::state::StepPhase;
use tokio::sync::mpsc::UnboundedSender;

/// 엔진에서 관찰자에게 전달되는 주요 이벤트 모델이다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Run 시작 알림.
    RunStarted { title: String, total: usize },
    /// Step 시작 알림. `index`는 1 기반이다.
    StepStarted { index: usize, total: usize },
    /// Step 내부 단계 전이.
    StepPhase { index: usize, phase: StepPhase },
    /// skip_steps 옵션으로 건너뛴 Step.
    StepSkipped { index: usize },
    /// Step 종료 알림.
    StepFinished { index: usize, success: bool },
    /// 전체 Run 종료.
    RunFinished { success: bool },
}

/// 관찰자가 연결되어 있으면 이벤트를 보낸다. 수신 측이 닫혀 있어도 무시한다.
pub(crate) fn emit(events: Option<&UnboundedSender<EngineEvent>>, event: EngineEvent) {
    if let Some(sender) = events {
        let _ = sender.send(event);
    }
}

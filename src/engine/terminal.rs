use crate::error::{RunError, RunResult};
use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex as StdMutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// 커서를 한 줄 위로 올리는 이스케이프 시퀀스.
pub const CURSOR_UP: &str = "\x1b[1A";

type Sink = Pin<Box<dyn AsyncWrite + Send>>;

/// Run 출력 대상을 감싸는 핸들이다.
///
/// 제목, Step 설명, 자식 프로세스 출력이 모두 같은 대상으로 기록된다.
/// 복제해도 같은 대상을 공유한다.
#[derive(Clone)]
pub struct Terminal {
    /// 공유 출력 대상이다.
    sink: Arc<Mutex<Sink>>,
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal").finish_non_exhaustive()
    }
}

impl Terminal {
    /// 임의의 비동기 writer를 출력 대상으로 사용한다.
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + 'static,
    {
        Self {
            sink: Arc::new(Mutex::new(Box::pin(writer))),
        }
    }

    /// 프로세스 표준 출력에 연결된 터미널을 생성한다.
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }

    /// 메모리 버퍼에 기록하는 터미널과 버퍼 핸들을 함께 반환한다.
    pub fn capture() -> (Self, CaptureBuffer) {
        let buffer = CaptureBuffer::default();
        (Self::new(buffer.clone()), buffer)
    }

    /// 문자열을 그대로 기록한다.
    pub async fn write(&self, text: &str) -> RunResult<()> {
        self.write_bytes(text.as_bytes()).await
    }

    /// 바이트 조각을 기록하고 즉시 flush 한다.
    pub async fn write_bytes(&self, bytes: &[u8]) -> RunResult<()> {
        let mut sink = self.sink.lock().await;
        sink.write_all(bytes).await.map_err(RunError::Write)?;
        sink.flush().await.map_err(RunError::Write)
    }

    /// 직전 줄을 덮어쓰도록 커서를 한 줄 올린다.
    pub async fn cursor_up(&self) -> RunResult<()> {
        self.write(CURSOR_UP).await
    }
}

/// 출력 내용을 메모리에 누적하는 writer이다.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    /// 누적된 바이트.
    bytes: Arc<StdMutex<Vec<u8>>>,
}

impl CaptureBuffer {
    /// 지금까지 기록된 내용을 문자열로 반환한다.
    pub fn contents(&self) -> String {
        let guard = self.bytes.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        String::from_utf8_lossy(&guard).into_owned()
    }
}

impl AsyncWrite for CaptureBuffer {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut guard = self.bytes.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

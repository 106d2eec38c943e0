use crate::engine::terminal::Terminal;
use crate::error::RunResult;
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{BytesCodec, FramedRead};

/// 프로세스 파이프를 읽어 받은 조각을 그대로 출력 대상에 중계한다.
pub(super) async fn pipe_forwarder<R>(reader: R, terminal: Terminal, tag: &'static str) -> RunResult<()>
where
    R: AsyncRead + Unpin,
{
    let mut chunks = FramedRead::new(reader, BytesCodec::new());
    while let Some(chunk) = chunks.next().await {
        match chunk {
            Ok(bytes) => terminal.write_bytes(&bytes).await?,
            Err(err) => {
                tracing::warn!(stream = tag, error = %err, "자식 프로세스 출력 읽기 오류");
                break;
            }
        }
    }
    Ok(())
}

/// 선택적 파이프를 중계한다. 파이프가 없으면 즉시 끝난다.
pub(super) async fn forward_optional<R>(
    reader: Option<R>,
    terminal: Terminal,
    tag: &'static str,
) -> RunResult<()>
where
    R: AsyncRead + Unpin,
{
    match reader {
        Some(reader) => pipe_forwarder(reader, terminal, tag).await,
        None => Ok(()),
    }
}

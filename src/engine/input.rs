use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::io;
use tokio::io::Stdin;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

/// 운영자에게서 개행 단위 입력을 받기 위한 추상 계층을 정의한다.
#[async_trait]
pub trait OperatorInput: Send {
    /// 한 줄을 읽는다. 입력이 닫혔으면 오류를 반환한다.
    async fn read_line(&mut self) -> io::Result<String>;
}

/// 프로세스 표준 입력에서 줄을 읽는 기본 구현이다.
pub struct StdinInput {
    /// 줄 단위로 분리된 표준 입력 스트림.
    lines: FramedRead<Stdin, LinesCodec>,
}

impl StdinInput {
    /// 표준 입력 리더를 생성한다. 실제 읽기는 첫 요청 시점에 시작된다.
    pub fn new() -> Self {
        Self {
            lines: FramedRead::new(tokio::io::stdin(), LinesCodec::new()),
        }
    }
}

impl Default for StdinInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperatorInput for StdinInput {
    async fn read_line(&mut self) -> io::Result<String> {
        match self.lines.next().await {
            Some(Ok(line)) => Ok(line),
            Some(Err(LinesCodecError::Io(err))) => Err(err),
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "입력 줄이 너무 깁니다.",
            )),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "표준 입력이 닫혔습니다.",
            )),
        }
    }
}

/// 미리 준비한 줄을 순서대로 돌려주는 입력이다.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    /// 남아 있는 입력 줄.
    lines: VecDeque<String>,
}

impl ScriptedInput {
    /// 주어진 줄 목록으로 입력을 구성한다.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// 아직 소비되지 않은 줄 수를 반환한다.
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl OperatorInput for ScriptedInput {
    async fn read_line(&mut self) -> io::Result<String> {
        self.lines.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "준비된 입력이 없습니다.")
        })
    }
}

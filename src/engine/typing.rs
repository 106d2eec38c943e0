use super::options::Options;
use super::terminal::Terminal;
use crate::error::{RunError, RunResult};
use crate::theme::Color;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 글자 하나를 출력할 때 둘 수 있는 최대 지연.
pub const MAX_KEYSTROKE_DELAY: Duration = Duration::from_millis(40);

/// 실시간 타이핑처럼 보이도록 글자 단위로 출력하는 렌더러 전략이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Typewriter {
    /// 지연 없이 한 번에 출력한다.
    Immediate,
    /// 글자마다 `0..max` 범위의 무작위 지연을 둔다.
    Random { max: Duration },
}

impl Typewriter {
    /// 옵션에 맞는 렌더러를 고른다.
    pub fn from_options(options: &Options) -> Self {
        if options.immediate {
            Typewriter::Immediate
        } else {
            Typewriter::Random {
                max: MAX_KEYSTROKE_DELAY,
            }
        }
    }

    fn keystroke_delay(&self) -> Option<Duration> {
        match self {
            Typewriter::Immediate => None,
            Typewriter::Random { max } => {
                let max_ms = max.as_millis() as u64;
                if max_ms == 0 {
                    return None;
                }
                Some(Duration::from_millis(rand::thread_rng().gen_range(0..max_ms)))
            }
        }
    }

    /// 한 메시지를 출력하고 개행으로 끝낸다.
    pub async fn type_line(
        &self,
        terminal: &Terminal,
        color: Option<Color>,
        text: &str,
        cancel: &CancellationToken,
    ) -> RunResult<()> {
        if *self == Typewriter::Immediate {
            let line = match color {
                Some(color) => color.paint(text),
                None => text.to_string(),
            };
            return terminal.write(&format!("{line}\n")).await;
        }
        if let Some(color) = color {
            terminal.write(color.code()).await?;
        }
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            if let Some(delay) = self.keystroke_delay() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(RunError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            terminal.write(ch.encode_utf8(&mut buf)).await?;
        }
        if color.is_some() {
            terminal.write(Color::RESET).await?;
        }
        terminal.write("\n").await
    }
}

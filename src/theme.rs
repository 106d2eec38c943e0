/// ANSI SGR 시퀀스 기반 색상 정의이다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(&'static str);

impl Color {
    /// 색상을 되돌리는 리셋 시퀀스.
    pub const RESET: &'static str = "\x1b[0m";

    /// 색상 시작 시퀀스를 반환한다.
    pub fn code(&self) -> &'static str {
        self.0
    }

    /// 문자열 전체를 색상으로 감싼다.
    pub fn paint(&self, text: &str) -> String {
        format!("{}{text}{}", self.0, Self::RESET)
    }
}

/// 터미널 출력 전체에서 참조할 공통 색상 팔레트.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    /// 제목과 밑줄 색상.
    pub title: Color,
    /// Step 설명 색상.
    pub description: Color,
    /// 실행 명령 색상.
    pub command: Color,
}

impl Default for Palette {
    /// 기본 팔레트를 정의한다.
    fn default() -> Self {
        Self {
            title: Color("\x1b[36m"),
            description: Color("\x1b[90m"),
            command: Color("\x1b[32m"),
        }
    }
}

impl Palette {
    /// no_color 옵션에 따라 사용할 색상을 고른다.
    pub fn pick(&self, no_color: bool, select: impl Fn(&Palette) -> Color) -> Option<Color> {
        if no_color { None } else { Some(select(self)) }
    }
}

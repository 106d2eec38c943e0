use crate::engine::{DEFAULT_SHELL, Options};
use anyhow::Context;
use serde::Deserialize;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 환경 변수 설정에 사용하는 접두어.
pub const ENV_PREFIX: &str = "RUNBOOK_";

const CONFIG_DIR: &str = "runbook";
const CONFIG_FILE: &str = "runbook.yaml";

/// 설정 파일, 환경 변수, 명령줄에서 모은 실행 설정이다.
///
/// 지정되지 않은 값은 `None`으로 남겨 두고 [`Settings::merge`]로 우선순위를 적용한다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// 명령 실행 셸.
    pub shell: Option<String>,
    /// auto 모드 여부.
    pub auto: Option<bool>,
    /// auto 모드 대기 시간 (`500ms`, `2s` 형식).
    #[serde(with = "humantime_serde")]
    pub auto_timeout: Option<Duration>,
    pub breakpoint: Option<bool>,
    pub continue_on_error: Option<bool>,
    pub hide_descriptions: Option<bool>,
    pub dry_run: Option<bool>,
    pub no_color: Option<bool>,
    pub immediate: Option<bool>,
    pub skip_steps: Option<usize>,
}

impl Settings {
    /// 사용자 설정 디렉터리 아래 기본 설정 파일 경로를 반환한다.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// 설정 파일을 읽는다.
    ///
    /// 경로를 명시했으면 파일이 반드시 있어야 하고, 기본 경로의 파일은 없어도 된다.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Settings> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Settings::default()),
            },
        };
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound && !required => {
                tracing::debug!(path = %path.display(), "설정 파일이 없어 기본값을 사용합니다.");
                return Ok(Settings::default());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("설정 파일을 열 수 없습니다: {}", path.display()));
            }
        };
        Self::from_reader(&mut file)
            .with_context(|| format!("설정 파일 파싱 실패: {}", path.display()))
    }

    /// Reader에서 YAML 설정을 읽는다. 빈 문서는 기본값으로 취급한다.
    pub fn from_reader<R: Read>(reader: &mut R) -> anyhow::Result<Settings> {
        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;
        if buf.trim().is_empty() {
            return Ok(Settings::default());
        }
        Ok(serde_yaml::from_str(&buf)?)
    }

    /// `RUNBOOK_` 접두어 환경 변수에서 설정을 읽는다.
    pub fn from_env() -> anyhow::Result<Settings> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 주어진 조회 함수로 `RUNBOOK_` 접두어 변수를 읽는다.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Settings> {
        let get = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key)
                .filter(|value| !value.trim().is_empty())
                .map(|value| (key, value))
        };
        let flag = |name: &str| -> anyhow::Result<Option<bool>> {
            get(name)
                .map(|(key, value)| parse_bool(&value).with_context(|| format!("{key} 값 오류")))
                .transpose()
        };
        Ok(Settings {
            shell: get("SHELL").map(|(_, value)| value),
            auto: flag("AUTO")?,
            auto_timeout: get("AUTO_TIMEOUT")
                .map(|(key, value)| {
                    humantime::parse_duration(value.trim())
                        .with_context(|| format!("{key} 값 오류: {value}"))
                })
                .transpose()?,
            breakpoint: flag("BREAKPOINT")?,
            continue_on_error: flag("CONTINUE_ON_ERROR")?,
            hide_descriptions: flag("HIDE_DESCRIPTIONS")?,
            dry_run: flag("DRY_RUN")?,
            no_color: flag("NO_COLOR")?,
            immediate: flag("IMMEDIATE")?,
            skip_steps: get("SKIP_STEPS")
                .map(|(key, value)| {
                    value
                        .trim()
                        .parse::<usize>()
                        .with_context(|| format!("{key} 값 오류: {value}"))
                })
                .transpose()?,
        })
    }

    /// `overrides`에 지정된 값으로 덮어쓴 설정을 반환한다.
    pub fn merge(self, overrides: Settings) -> Settings {
        Settings {
            shell: overrides.shell.or(self.shell),
            auto: overrides.auto.or(self.auto),
            auto_timeout: overrides.auto_timeout.or(self.auto_timeout),
            breakpoint: overrides.breakpoint.or(self.breakpoint),
            continue_on_error: overrides.continue_on_error.or(self.continue_on_error),
            hide_descriptions: overrides.hide_descriptions.or(self.hide_descriptions),
            dry_run: overrides.dry_run.or(self.dry_run),
            no_color: overrides.no_color.or(self.no_color),
            immediate: overrides.immediate.or(self.immediate),
            skip_steps: overrides.skip_steps.or(self.skip_steps),
        }
    }

    /// 실행 옵션으로 변환한다. 셸은 `bash`, auto 모드는 켜짐이 기본이다.
    pub fn into_options(self) -> Options {
        Options {
            auto_timeout: self.auto_timeout.unwrap_or_default(),
            auto: self.auto.unwrap_or(true),
            breakpoint: self.breakpoint.unwrap_or_default(),
            continue_on_error: self.continue_on_error.unwrap_or_default(),
            hide_descriptions: self.hide_descriptions.unwrap_or_default(),
            dry_run: self.dry_run.unwrap_or_default(),
            no_color: self.no_color.unwrap_or_default(),
            immediate: self.immediate.unwrap_or_default(),
            skip_steps: self.skip_steps.unwrap_or_default(),
            shell: self.shell.unwrap_or_else(|| DEFAULT_SHELL.to_string()),
        }
    }
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("불리언 값이 아닙니다: {other}"),
    }
}

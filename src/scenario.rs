use crate::engine::{Run, Step};
use anyhow::Context;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 런북 정의 검증 중 발생 가능한 오류를 표현한다.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RunbookError {
    /// 설명도 명령도 없는 Step이다.
    #[error("{0}번째 Step에 설명과 명령이 모두 비어 있습니다.")]
    EmptyStep(usize),
}

/// 런북 파일의 Step 정의이다.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunbookStep {
    /// 설명 줄 목록. 문자열 하나 또는 목록을 허용한다.
    #[serde(default, deserialize_with = "one_or_many")]
    pub description: Vec<String>,
    /// 명령 토큰 목록. 문자열 하나 또는 목록을 허용한다.
    #[serde(default, deserialize_with = "one_or_many")]
    pub command: Vec<String>,
    /// 명령 실패를 무시할지 여부.
    #[serde(default)]
    pub can_fail: bool,
    /// 수동 정지 지점 여부.
    #[serde(default)]
    pub breakpoint: bool,
}

/// Runbook은 제목과 Step 목록으로 구성된 전체 실행 정의다.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Runbook {
    /// 제목.
    pub title: String,
    /// 제목 아래 출력할 설명.
    #[serde(default, deserialize_with = "one_or_many")]
    pub description: Vec<String>,
    /// Step 목록.
    #[serde(default)]
    pub steps: Vec<RunbookStep>,
}

impl Runbook {
    /// 실행할 수 없는 Step이 있는지 확인한다.
    pub fn validate(&self) -> Result<(), RunbookError> {
        for (i, step) in self.steps.iter().enumerate() {
            if step.description.is_empty() && step.command.is_empty() {
                return Err(RunbookError::EmptyStep(i + 1));
            }
        }
        Ok(())
    }

    /// 전체 Step 수를 반환한다.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Step 수가 비었는지 여부를 확인한다.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 정의를 실행 가능한 Run으로 변환한다.
    pub fn into_run(self) -> Run {
        let mut run = Run::new(self.title, self.description);
        for step in self.steps {
            run.push_step(
                Step::new(step.description, step.command)
                    .with_can_fail(step.can_fail)
                    .with_breakpoint(step.breakpoint),
            );
        }
        run
    }
}

/// 문자열 하나 또는 문자열 목록을 모두 목록으로 역직렬화한다.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Helper>::deserialize(deserializer)? {
        Some(Helper::One(value)) => vec![value],
        Some(Helper::Many(values)) => values,
        None => Vec::new(),
    })
}

/// YAML 파일을 읽어 Runbook으로 역직렬화한다.
pub fn load_runbook_from_file(path: &Path) -> anyhow::Result<Runbook> {
    let mut file =
        File::open(path).with_context(|| format!("런북 파일을 열 수 없습니다: {}", path.display()))?;
    load_runbook_from_reader(&mut file)
        .with_context(|| format!("런북 파일 파싱 실패: {}", path.display()))
}

/// Reader에서 YAML을 읽어 Runbook 구조체로 파싱하고 검증한다.
pub fn load_runbook_from_reader<R: Read>(reader: &mut R) -> anyhow::Result<Runbook> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    let runbook: Runbook = serde_yaml::from_str(&buf)?;
    runbook.validate()?;
    Ok(runbook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn description_and_command_accept_string_or_list() {
        let yaml = r#"
title: Demo
description: intro
steps:
  - description: desc one
    command: "true"
  - description: [line a, line b]
    command: [echo, hi]
    can_fail: true
    breakpoint: true
  - description: text only
"#;
        let runbook = load_runbook_from_reader(&mut yaml.as_bytes()).expect("파싱 실패");
        assert_eq!(runbook.description, vec!["intro"]);
        assert_eq!(runbook.len(), 3);
        assert_eq!(runbook.steps[0].command, vec!["true"]);
        assert_eq!(runbook.steps[1].description, vec!["line a", "line b"]);
        assert!(runbook.steps[1].can_fail && runbook.steps[1].breakpoint);
        assert!(runbook.steps[2].command.is_empty());
    }

    #[test]
    fn empty_step_is_rejected() {
        let yaml = "title: Broken\nsteps:\n  - description: ok\n  - can_fail: true\n";
        let err = load_runbook_from_reader(&mut yaml.as_bytes()).expect_err("실패해야 합니다.");
        assert_eq!(
            err.downcast_ref::<RunbookError>(),
            Some(&RunbookError::EmptyStep(2))
        );
    }

    #[test]
    fn null_command_means_description_only() {
        let yaml = "title: T\nsteps:\n  - description: d\n    command: ~\n";
        let runbook = load_runbook_from_reader(&mut yaml.as_bytes()).expect("파싱 실패");
        assert!(runbook.steps[0].command.is_empty());
    }

    #[test]
    fn into_run_preserves_order_and_flags() {
        let runbook = Runbook {
            title: "T".into(),
            description: Vec::new(),
            steps: vec![
                RunbookStep {
                    description: vec!["a".into()],
                    command: vec!["true".into()],
                    can_fail: true,
                    breakpoint: false,
                },
                RunbookStep {
                    description: vec!["b".into()],
                    breakpoint: true,
                    ..RunbookStep::default()
                },
            ],
        };
        let run = runbook.into_run();
        assert_eq!(run.title(), "T");
        assert_eq!(run.steps().len(), 2);
        assert!(run.steps()[0].can_fail());
        assert!(run.steps()[1].is_breakpoint());
        assert_eq!(run.steps()[1].description().to_vec(), vec!["b".to_string()]);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("임시 파일 생성 실패");
        writeln!(file, "title: From file\nsteps:\n  - description: x").expect("쓰기 실패");
        let runbook = load_runbook_from_file(file.path()).expect("로드 실패");
        assert_eq!(runbook.title, "From file");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_runbook_from_file(Path::new("/nonexistent/runbook.yaml"))
            .expect_err("실패해야 합니다.");
        assert!(format!("{err:#}").contains("/nonexistent/runbook.yaml"));
    }

    #[test]
    fn bundled_runbooks_are_valid() {
        for source in [
            include_str!("../runbooks/install.yaml"),
            include_str!("../runbooks/sdc.yaml"),
            include_str!("../runbooks/networkconfig.yaml"),
            include_str!("../runbooks/destroy.yaml"),
        ] {
            let runbook = load_runbook_from_reader(&mut source.as_bytes()).expect("파싱 실패");
            assert!(!runbook.is_empty());
            assert!(runbook.steps.iter().all(|step| !step.command.is_empty()));
        }
    }
}

use clap::Parser;
use runbook::RunError;
use runbook::config::Settings;
use runbook::scenario::load_runbook_from_file;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// 인터럽트로 중단되었을 때의 종료 코드.
const EXIT_INTERRUPTED: u8 = 130;

/// 런북 파일의 Step을 순서대로 보여 주며 셸 명령을 실행한다.
#[derive(Debug, Parser)]
#[command(name = "runbook", version, about)]
struct Cli {
    /// 실행할 런북 YAML 파일.
    runbook: PathBuf,
    /// 설정 파일 경로. 지정하지 않으면 사용자 설정 디렉터리의 runbook/runbook.yaml을 사용한다.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// 명령 실행에 사용할 셸.
    #[arg(long)]
    shell: Option<String>,
    /// 명령을 출력만 하고 실행하지 않는다.
    #[arg(long)]
    dry_run: bool,
    /// 색상 없이 출력한다.
    #[arg(long)]
    no_color: bool,
    /// 타자 효과 없이 즉시 출력한다.
    #[arg(long)]
    immediate: bool,
    /// Step마다 Enter 입력을 기다린다.
    #[arg(short, long)]
    interactive: bool,
    /// breakpoint Step에서 멈춘다.
    #[arg(long)]
    breakpoints: bool,
    /// 명령이 실패해도 다음 Step을 계속 실행한다.
    #[arg(long)]
    continue_on_error: bool,
    /// Step 설명을 출력하지 않는다.
    #[arg(long)]
    hide_descriptions: bool,
    /// 앞에서부터 건너뛸 Step 수.
    #[arg(long, value_name = "N")]
    skip_steps: Option<usize>,
    /// auto 모드에서 Step 사이 대기 시간 (예: 500ms, 2s).
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    auto_timeout: Option<Duration>,
}

impl Cli {
    /// 명령줄에서 명시한 값만 설정으로 만든다.
    fn overrides(&self) -> Settings {
        let flag = |set: bool| set.then_some(true);
        Settings {
            shell: self.shell.clone(),
            auto: self.interactive.then_some(false),
            auto_timeout: self.auto_timeout,
            breakpoint: flag(self.breakpoints),
            continue_on_error: flag(self.continue_on_error),
            hide_descriptions: flag(self.hide_descriptions),
            dry_run: flag(self.dry_run),
            no_color: flag(self.no_color),
            immediate: flag(self.immediate),
            skip_steps: self.skip_steps,
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let runtime = match Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: Tokio 런타임 생성 실패: {err}");
            return ExitCode::FAILURE;
        }
    };
    let code = runtime.block_on(async {
        match execute(cli).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) if matches!(err.downcast_ref::<RunError>(), Some(RunError::Cancelled)) => {
                eprintln!("\n{err}");
                ExitCode::from(EXIT_INTERRUPTED)
            }
            Err(err) => {
                eprintln!("error: {err:#}");
                ExitCode::FAILURE
            }
        }
    });
    // 표준 입력 읽기가 대기 중이어도 종료를 막지 않도록 기다리지 않는다
    runtime.shutdown_background();
    code
}

/// 로그는 표준 에러로 보내 런북 출력과 섞이지 않게 한다.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn execute(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref())?
        .merge(Settings::from_env()?)
        .merge(cli.overrides());
    let runbook = load_runbook_from_file(&cli.runbook)?;
    let mut run = runbook.into_run();
    run.set_options(settings.into_options());
    tracing::debug!(options = ?run.options(), "실행 옵션");

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("인터럽트 수신, 실행을 중단합니다.");
            token.cancel();
        }
    });

    run.run(cancel).await?;
    let summary = run.summary();
    tracing::info!(
        succeeded = summary.succeeded.len(),
        skipped = summary.skipped.len(),
        "런북 실행 완료"
    );
    Ok(())
}

use std::fmt::Write as _;
use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use twid_core::core::events::TracingEmitter;
use twid_core::models::settings::Config;

pub mod cli;
pub mod core;
pub mod platforms;
pub mod storage;

use platforms::twitter::{run_user, unique_users, UserReport};

pub fn init_tracing(dev: bool) {
    let default_level = if dev { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run() -> ExitCode {
    let cli = cli::Cli::parse();
    let config = match storage::config::load_config(cli.to_config(), cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✘ {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(config.dev);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("✘ Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(execute(config)) {
        Ok(reports) => {
            println!("{}", render_summary(&reports));
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("✘ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Validates the configuration, then processes every profile concurrently.
/// Per-asset and per-profile failures end up in the reports; only an
/// unusable configuration is an error.
pub async fn execute(config: Config) -> anyhow::Result<Vec<UserReport>> {
    let token = config.validate()?.to_string();
    let client = crate::core::http_client::build_client()?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, abandoning in-flight work");
                cancel.cancel();
            }
        }
    });

    let users = unique_users(&config.users);
    tracing::info!("ℹ users({}) ❯ ({})", users.len(), users.join(", "));

    let runs = users.iter().map(|user| {
        run_user(
            &config,
            &token,
            user,
            client.clone(),
            cancel.clone(),
            TracingEmitter,
        )
    });
    let results = futures::future::join_all(runs).await;

    let reports = users
        .iter()
        .zip(results)
        .map(|(user, result)| match result {
            Ok(report) => report,
            Err(e) => {
                tracing::error!("✘ user({}) ❯ {:#}", user, e);
                UserReport::errored(*user, &e)
            }
        })
        .collect();
    Ok(reports)
}

pub fn render_summary(reports: &[UserReport]) -> String {
    let mut out = String::new();
    for report in reports {
        if let Some(ref error) = report.error {
            let _ = writeln!(out, "✘ {} ❯ {}", report.user, error);
            continue;
        }

        let _ = writeln!(
            out,
            "✔ {} ❯ {}/{} downloaded in {:.1}s ❯ {}",
            report.user,
            report.succeeded(),
            report.discovered,
            report.elapsed.as_secs_f64(),
            report.output_dir.display()
        );
        for failed in &report.failed {
            let _ = writeln!(out, "  ✘ {} ❯ {}", failed.record.url, failed.reason);
        }
    }
    out.trim_end().to_string()
}

use serde::Serialize;
use shopdesk_agent::LlmGateway;
use shopdesk_core::catalog::CatalogSource;
use shopdesk_core::config::{AppConfig, LoadOptions};
use shopdesk_core::prompt::{FileInstructions, InstructionSource};
use shopdesk_db::{connect_with_settings, SqlCatalogSource};

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const CHECKS_AFTER_CONFIG: [&str; 4] =
    ["database_connectivity", "instruction_file", "catalog_snapshot", "llm_client"];

/// Exit code 1 when any check failed or was skipped; warnings still exit 0.
pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = report_exit_code(&report);

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn report_exit_code(report: &DoctorReport) -> u8 {
    match report.overall_status {
        CheckStatus::Fail | CheckStatus::Skipped => 1,
        CheckStatus::Pass | CheckStatus::Warn => 0,
    }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(runtime_checks(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.extend(CHECKS_AFTER_CONFIG.iter().map(|&name| DoctorCheck {
                name,
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            }));
        }
    }

    summarize(checks)
}

/// Warnings (empty catalog, unavailable LLM client) do not fail the report:
/// the server starts and answers in those states.
fn summarize(checks: Vec<DoctorCheck>) -> DoctorReport {
    let any_fail =
        checks.iter().any(|check| matches!(check.status, CheckStatus::Fail | CheckStatus::Skipped));
    let any_warn = checks.iter().any(|check| check.status == CheckStatus::Warn);

    let (overall_status, summary) = if any_fail {
        (CheckStatus::Fail, "doctor: one or more readiness checks failed")
    } else if any_warn {
        (CheckStatus::Warn, "doctor: ready with warnings")
    } else {
        (CheckStatus::Pass, "doctor: all readiness checks passed")
    };

    DoctorReport { overall_status, summary: summary.to_string(), checks }
}

fn runtime_checks(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            }];
        }
    };

    runtime.block_on(async {
        vec![
            check_database_connectivity(config).await,
            check_instruction_file(config),
            check_catalog(config).await,
            check_llm_client(config),
        ]
    })
}

async fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let result = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await;

    match result {
        Ok(pool) => {
            pool.close().await;
            DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Pass,
                details: format!("connected using `{}`", config.database.url),
            }
        }
        Err(error) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Fail,
            details: format!("failed to connect to database: {error}"),
        },
    }
}

fn check_instruction_file(config: &AppConfig) -> DoctorCheck {
    match FileInstructions::new(&config.prompt.instructions_path).read_instructions() {
        Ok(template) => DoctorCheck {
            name: "instruction_file",
            status: CheckStatus::Pass,
            details: format!(
                "read {} characters from `{}`",
                template.chars().count(),
                config.prompt.instructions_path.display()
            ),
        },
        Err(error) => DoctorCheck {
            name: "instruction_file",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

async fn check_catalog(config: &AppConfig) -> DoctorCheck {
    let url = config.catalog.effective_url(&config.database);
    let source = SqlCatalogSource::new(url, config.database.timeout_secs);

    match source.fetch_all().await {
        Ok(products) if products.is_empty() => DoctorCheck {
            name: "catalog_snapshot",
            status: CheckStatus::Warn,
            details: "catalog is empty; run `shopdesk seed` to load demo products".to_string(),
        },
        Ok(products) => DoctorCheck {
            name: "catalog_snapshot",
            status: CheckStatus::Pass,
            details: format!("{} products readable from `{url}`", products.len()),
        },
        Err(error) => DoctorCheck {
            name: "catalog_snapshot",
            status: CheckStatus::Warn,
            details: format!("{error}; the server would start with an empty catalog"),
        },
    }
}

fn check_llm_client(config: &AppConfig) -> DoctorCheck {
    match LlmGateway::initialize(&config.llm) {
        Ok(gateway) => match gateway.unavailable_reason() {
            None => DoctorCheck {
                name: "llm_client",
                status: CheckStatus::Pass,
                details: format!("client ready for `{}`", gateway.model_uri()),
            },
            Some(reason) => DoctorCheck {
                name: "llm_client",
                status: CheckStatus::Warn,
                details: format!("client unavailable: {reason}"),
            },
        },
        Err(error) => {
            DoctorCheck { name: "llm_client", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::{report_exit_code, render_human, summarize, CheckStatus, DoctorCheck};

    fn check(name: &'static str, status: CheckStatus) -> DoctorCheck {
        DoctorCheck { name, status, details: String::new() }
    }

    #[test]
    fn warnings_do_not_fail_the_report() {
        let report = summarize(vec![
            check("config_validation", CheckStatus::Pass),
            check("catalog_snapshot", CheckStatus::Warn),
        ]);

        assert_eq!(report.overall_status, CheckStatus::Warn);
        assert_eq!(report.summary, "doctor: ready with warnings");
        assert_eq!(report_exit_code(&report), 0);
    }

    #[test]
    fn skipped_checks_fail_the_report() {
        let report = summarize(vec![
            check("config_validation", CheckStatus::Fail),
            check("database_connectivity", CheckStatus::Skipped),
        ]);

        assert_eq!(report.overall_status, CheckStatus::Fail);
        assert_eq!(report_exit_code(&report), 1);
        assert!(render_human(&report).contains("- [skip] database_connectivity"));
    }

    #[test]
    fn passing_report_exits_cleanly() {
        let report = summarize(vec![
            check("config_validation", CheckStatus::Pass),
            check("database_connectivity", CheckStatus::Pass),
        ]);

        assert_eq!(report.overall_status, CheckStatus::Pass);
        assert_eq!(report_exit_code(&report), 0);
    }
}

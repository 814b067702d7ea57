use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use configs::{AppConfig, BackendKind};
use models::TabDescriptor;
use service::identity::{IdentityOptions, IdentityState};
use service::policy::SchemePolicy;
use service::storage::{JsonFileBackend, MemoryBackend, StorageBackend};
use service::tabs::StaticTabs;

type Svc = IdentityState<dyn StorageBackend, StaticTabs, SchemePolicy>;

const USAGE: &str = "usage: identity-state <map | show <container> | lookup <uuid> | add-uuid <container> | assign <container> <uuid> | forget <container> | archive <container> <window> <tabs.json>>";

fn init_logging() {
    // 提前加载 .env，使得 RUST_LOG / LOG_FORMAT 等环境变量生效
    dotenv().ok();
    if std::env::var("LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false) {
        common::utils::logging::init_logging_json();
    } else {
        common::utils::logging::init_logging_default();
    }
    info!(service = "identity-state", event = "logger_init", "tracing subscriber initialized");
}

fn load_config() -> Result<AppConfig> {
    match AppConfig::load_and_validate() {
        Ok(cfg) => Ok(cfg),
        Err(e) => {
            // 配置文件缺失时回退到默认配置（仍应用环境变量覆盖）
            warn!(event = "config_fallback", error = %e, "config not loaded, using defaults");
            let mut cfg = AppConfig::default();
            cfg.normalize_and_validate()?;
            Ok(cfg)
        }
    }
}

/// The CLI has no live browser: `archive` reads the window's tabs from a JSON
/// file into `tabs`. A `memory` backend makes every command a dry run.
async fn build_service(cfg: &AppConfig, tabs: Arc<StaticTabs>) -> Result<Svc> {
    let backend: Arc<dyn StorageBackend> = match cfg.storage.backend {
        BackendKind::File => JsonFileBackend::new(cfg.storage.path.as_str()).await?,
        BackendKind::Memory => {
            warn!(event = "dry_run", "memory backend selected, nothing will be persisted");
            Arc::new(MemoryBackend::new())
        }
    };
    let opts = IdentityOptions {
        serialize_writes: cfg.identity.serialize_writes,
        secondary_index: cfg.identity.secondary_index,
        max_hidden_tabs: cfg.identity.hidden_tabs_limit(),
    };
    Ok(IdentityState::new(
        backend,
        tabs,
        SchemePolicy::new(&cfg.identity.blocked_schemes),
        opts,
    ))
}

async fn run(svc: &Svc, tabs: &StaticTabs, args: &[String]) -> Result<Value> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        ["map"] => Ok(json!(svc.map_of_identifier_to_uuid().await?)),
        ["show", container] => Ok(serde_json::to_value(svc.container_state(container).await?)?),
        ["lookup", uuid] => Ok(json!(svc.lookup_identifier_by_uuid(uuid).await?)),
        ["add-uuid", container] => Ok(json!({ "container": container, "macAddonUUID": svc.add_new_uuid(container).await? })),
        ["assign", container, uuid] => {
            svc.assign_uuid(container, uuid).await?;
            Ok(json!({ "container": container, "macAddonUUID": uuid }))
        }
        ["forget", container] => {
            svc.forget(container).await?;
            Ok(json!({ "container": container, "removed": true }))
        }
        ["archive", container, window, tabs_file] => {
            let window: i64 = window.parse().map_err(|e| anyhow!("invalid window id {window:?}: {e}"))?;
            let listed: Vec<TabDescriptor> = serde_json::from_slice(&tokio::fs::read(tabs_file).await?)?;
            tabs.put(container, window, listed).await;
            let archived = svc.archive_hidden_tabs(container, window).await?;
            Ok(json!({ "container": container, "window": window, "archived": archived }))
        }
        _ => Err(anyhow!(USAGE)),
    }
}

fn main() -> ExitCode {
    init_logging();

    let run_id = Uuid::new_v4();
    let args: Vec<String> = std::env::args().skip(1).collect();
    info!(service = "identity-state", event = "start", %run_id, version = env!("CARGO_PKG_VERSION"), "identity-state starting");

    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "identity-state", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = rt.block_on(async {
        let cfg = load_config()?;
        let tabs = Arc::new(StaticTabs::new());
        let svc = build_service(&cfg, tabs.clone()).await?;
        run(&svc, &tabs, &args).await
    });

    match result {
        Ok(out) => {
            match serde_json::to_string_pretty(&out) {
                Ok(text) => println!("{text}"),
                Err(e) => {
                    error!(service = "identity-state", event = "encode_failed", error = %e, "cannot encode output");
                    return ExitCode::FAILURE;
                }
            }
            info!(service = "identity-state", event = "stop", %run_id, "identity-state finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = "identity-state", event = "command_failed", %run_id, error = %e, "command failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn archive_command_reads_tabs_file() -> Result<()> {
        let tabs_file = std::env::temp_dir().join(format!("tabs_{}.json", Uuid::new_v4()));
        tokio::fs::write(
            &tabs_file,
            serde_json::to_vec(&json!([
                { "url": "https://a", "active": true, "id": 7 },
                { "url": "about:config", "active": false }
            ]))?,
        )
        .await?;

        let mut cfg = AppConfig::default();
        cfg.storage.backend = BackendKind::Memory;
        let tabs = Arc::new(StaticTabs::new());
        let svc = build_service(&cfg, tabs.clone()).await?;

        let path = tabs_file.to_string_lossy().to_string();
        let out = run(&svc, &tabs, &args(&["archive", "firefox-container-1", "3", &path])).await?;
        assert_eq!(out["archived"], json!(1));

        let shown = run(&svc, &tabs, &args(&["show", "firefox-container-1"])).await?;
        assert_eq!(shown["hiddenTabs"][0]["url"], json!("https://a"));
        assert_eq!(shown["hiddenTabs"][0]["hiddenState"], json!(true));

        assert!(run(&svc, &tabs, &args(&["archive", "firefox-container-1", "x", &path])).await.is_err());
        let _ = tokio::fs::remove_file(&tabs_file).await;
        Ok(())
    }
}

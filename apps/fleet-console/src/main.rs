//! 控制台进程入口：加载配置，激活控制台，Ctrl-C 时停用。

use fleet_config::ConsoleConfig;
use fleet_console::{Console, ConsoleSettings, LogNotifier};
use fleet_gateway::HttpGateway;
use fleet_telemetry::{init_tracing, metrics};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = ConsoleConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    let gateway = Arc::new(HttpGateway::new(&config.api_base, config.request_timeout)?);
    let notifier = Arc::new(LogNotifier::new(config.auto_confirm));
    let console = Console::new(gateway, notifier, ConsoleSettings::from_config(&config));

    let report = console.activate().await;
    let stats = console.store().roster_stats();
    info!(
        target: "fleet.console",
        operator_id = console.ctx().operator_id,
        entries = stats.total,
        facilities = stats.facilities,
        failed_slices = report.failed.len(),
        "initial_load_finished"
    );

    tokio::signal::ctrl_c().await?;
    console.deactivate().await;

    let snapshot = metrics().snapshot();
    info!(
        target: "fleet.console",
        polls_succeeded = snapshot.polls_succeeded,
        polls_failed = snapshot.polls_failed,
        commands_issued = snapshot.commands_issued,
        events_logged = snapshot.events_logged,
        "console_shutdown"
    );
    Ok(())
}

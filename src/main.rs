// ==========================================
// 工程师能力矩阵系统 - 命令行入口
// ==========================================
// 打开默认数据库，输出团队驾驶舱摘要 (JSON)
// ==========================================

use anyhow::Context;
use competency_matrix::app::{get_default_db_path, AppState};
use competency_matrix::logging;

fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", competency_matrix::APP_NAME);
    tracing::info!("系统版本: {}", competency_matrix::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径（可由命令行第一个参数覆盖）
    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let app_state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    let settings = app_state.config_api.get_settings()?;
    tracing::info!(
        history_cap = ?settings.history_cap,
        snapshot_retention = settings.snapshot_retention,
        "当前设置"
    );

    let dashboard = app_state
        .dashboard_api
        .team_dashboard(false)
        .context("生成团队驾驶舱失败")?;

    tracing::info!(
        engineers = dashboard.engineer_count,
        competencies = dashboard.competency_count,
        completion = dashboard.team_completion.percent,
        "团队驾驶舱"
    );
    for insight in &dashboard.insights {
        tracing::info!(kind = %insight.kind, title = %insight.title, "{}", insight.message);
    }

    println!("{}", serde_json::to_string_pretty(&dashboard)?);
    Ok(())
}

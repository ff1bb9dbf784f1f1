// ==========================================
// DashboardApi 集成测试
// ==========================================
// 标准数据（见 test_helpers）:
// - Alice 3/3/3  → raw 100%, weighted 100%
// - Bob   0/1/3  → raw 44.4%, weighted 63.0%
// - Carol 3/0/3  → raw 66.7%, weighted 77.8%
// ==========================================

mod test_helpers;

use competency_matrix::api::ApiError;
use competency_matrix::domain::types::{GapPriority, HeatmapBand, InsightKind, Shift, TrainingPriority};
use test_helpers::{approx, TestEnv};

fn setup() -> TestEnv {
    let env = TestEnv::new().expect("创建测试环境失败");
    env.seed().expect("写入标准数据失败");
    env.seed_scores().expect("写入标准评分失败");
    env
}

#[test]
fn test_engineer_report_加权与不加权() {
    let env = setup();
    let api = &env.state.dashboard_api;

    let report = api.engineer_report("E2", false).expect("生成报告失败");
    assert_eq!(report.engineer.name, "Bob");
    assert_eq!(report.score.raw, 4);
    assert_eq!(report.score.max_raw, 9);
    assert_eq!(report.score.weighted, 17);
    assert_eq!(report.score.max_weighted, 27);
    assert!(approx(report.score.raw_percent, 44.44));
    assert!(approx(report.score.weighted_percent, 62.96));

    assert_eq!(report.area_rollups.len(), 1);
    assert_eq!(report.machine_rollups.len(), 2);
    assert_eq!(report.machine_rollups[0].raw, 1);
    assert!(approx(report.machine_rollups[1].percent, 100.0));

    assert_eq!(report.radar.len(), 1);
    assert_eq!(report.radar[0].area, "Filling");
    assert!(approx(report.radar[0].percent, 44.44));
    assert!(approx(report.radar[0].full_mark, 100.0));

    let weighted = api.engineer_report("E2", true).unwrap();
    assert!(approx(weighted.radar[0].percent, 62.96));
}

#[test]
fn test_engineer_report_未知工程师() {
    let env = setup();
    let result = env.state.dashboard_api.engineer_report("E404", false);
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[test]
fn test_engineer_report_核心技能() {
    let env = setup();
    env.state
        .assessment_api
        .set_core_skill_score("E1|K1|S1", 3, "lead")
        .unwrap();

    let report = env.state.dashboard_api.engineer_report("E1", false).unwrap();
    assert_eq!(report.core_skills.raw, 3);
    assert_eq!(report.core_skills.max_raw, 6);
    assert!(approx(report.core_skills.percent, 50.0));
    assert_eq!(report.core_skills.below_competent, 1);
    assert_eq!(report.core_categories.len(), 1);
    assert_eq!(report.core_categories[0].category_name, "Safety");
}

#[test]
fn test_training_plan_按分数升序() {
    let env = setup();
    let plan = env.state.dashboard_api.training_plan("E2").unwrap();

    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].competency_id, "C1");
    assert_eq!(plan[0].current_score, 0);
    assert_eq!(plan[0].target_score, 3);
    assert_eq!(plan[0].priority, TrainingPriority::Critical);
    assert_eq!(plan[1].competency_id, "C2");
    assert_eq!(plan[1].priority, TrainingPriority::High);

    assert!(env.state.dashboard_api.training_plan("E1").unwrap().is_empty());
}

#[test]
fn test_heatmap_色带() {
    let env = setup();
    let rows = env.state.dashboard_api.heatmap(None).unwrap();

    assert_eq!(rows.len(), 3);
    let bob = rows.iter().find(|r| r.engineer_id == "E2").expect("应包含 Bob");
    assert_eq!(bob.shift, Shift::B);
    assert_eq!(bob.cells.len(), 3);
    assert_eq!(bob.cells[0].band, HeatmapBand::Untrained);
    assert_eq!(bob.cells[1].band, HeatmapBand::Beginner);
    assert_eq!(bob.cells[2].band, HeatmapBand::Expert);

    let filtered = env.state.dashboard_api.heatmap(Some("PA9")).unwrap();
    assert!(filtered.iter().all(|r| r.cells.is_empty()));
}

#[test]
fn test_skills_gap_排序与优先级() {
    let env = setup();
    let gaps = env.state.dashboard_api.skills_gap(None).unwrap();

    // C3 全员满分，不列出
    assert_eq!(gaps.len(), 2);
    assert_eq!(gaps[0].competency_id, "C2");
    assert!(approx(gaps[0].current_avg, 1.333));
    assert!(approx(gaps[0].gap, 1.667));
    assert_eq!(gaps[0].priority, GapPriority::Medium);
    assert_eq!(gaps[1].competency_id, "C1");
    assert!(approx(gaps[1].gap, 1.0));
    assert_eq!(gaps[1].priority, GapPriority::Low);
}

#[test]
fn test_shift_comparison_只列有人班次() {
    let env = setup();
    let shifts = env.state.dashboard_api.shift_comparison(false).unwrap();

    assert_eq!(shifts.len(), 2);
    assert_eq!(shifts[0].shift, Shift::A);
    assert_eq!(shifts[0].engineer_count, 2);
    assert!(approx(shifts[0].average_percent, 83.33));
    assert_eq!(shifts[0].best_engineer.as_deref(), Some("Alice"));
    assert_eq!(shifts[1].shift, Shift::B);
    assert!(approx(shifts[1].average_percent, 44.44));
}

#[test]
fn test_team_dashboard_洞察() {
    let env = setup();
    let dashboard = env.state.dashboard_api.team_dashboard(false).unwrap();

    assert_eq!(dashboard.engineer_count, 3);
    assert_eq!(dashboard.competency_count, 3);
    assert_eq!(dashboard.team_completion.total_score, 19);
    assert_eq!(dashboard.team_completion.total_max_score, 27);
    assert!(approx(dashboard.team_completion.percent, 70.37));
    assert_eq!(dashboard.distribution.total_cells, 9);
    assert_eq!(dashboard.distribution.count(3), 6);
    assert_eq!(dashboard.distribution.needs_training, 3);

    let ranking: Vec<&str> = dashboard.ranking.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(ranking, vec!["Alice", "Carol", "Bob"]);
    assert_eq!(dashboard.ranking[0].rank, 1);

    // 没有快照 → 无趋势洞察
    assert!(dashboard.trend.is_none());
    let kinds: Vec<InsightKind> = dashboard.insights.iter().map(|i| i.kind).collect();
    assert_eq!(
        kinds,
        vec![InsightKind::Alert, InsightKind::Warning, InsightKind::Positive]
    );
    assert!(dashboard.insights[2].message.contains("Alice"));
}

#[test]
fn test_team_dashboard_空目录() {
    let env = TestEnv::new().expect("创建测试环境失败");
    let dashboard = env.state.dashboard_api.team_dashboard(true).unwrap();

    assert_eq!(dashboard.engineer_count, 0);
    assert!(approx(dashboard.team_completion.percent, 0.0));
    assert!(dashboard.skills_gap.is_empty());
    assert!(dashboard.shifts.is_empty());
    assert!(dashboard.ranking.is_empty());
    assert!(dashboard.insights.is_empty());
}

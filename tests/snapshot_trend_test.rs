// ==========================================
// SnapshotApi 集成测试
// ==========================================
// 覆盖: 拍摄/列表/查询/删除、保留数量、完成度序列、趋势预测
// ==========================================

mod test_helpers;

use competency_matrix::api::ApiError;
use competency_matrix::domain::types::{InsightKind, TrendDirection};
use test_helpers::{approx, TestEnv};

fn setup() -> TestEnv {
    let env = TestEnv::new().expect("创建测试环境失败");
    env.seed().expect("写入标准数据失败");
    env
}

#[test]
fn test_take_snapshot_深拷贝() {
    let env = setup();
    env.seed_scores().unwrap();
    let snapshot_api = &env.state.snapshot_api;

    let header = snapshot_api.take_snapshot("Q1 review").expect("拍摄快照失败");
    assert_eq!(header.description, "Q1 review");

    // 快照之后的修改不影响快照内容
    env.state
        .assessment_api
        .set_score("E2|PA1|M1|C1", 3, "lead")
        .unwrap();
    env.state.entity_api.remove_engineer("E3").unwrap();

    let snapshot = snapshot_api.get_snapshot(&header.id).unwrap();
    assert_eq!(snapshot.data.engineers.len(), 3);
    assert_eq!(snapshot.data.assessments.len(), 8);
    assert_eq!(snapshot.data.ledger().get_score(&"E2|PA1|M1|C1".parse().unwrap()), 0);
}

#[test]
fn test_take_snapshot_描述不能为空() {
    let env = setup();
    let result = env.state.snapshot_api.take_snapshot("   ");
    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    assert!(env.state.snapshot_api.list_snapshots().unwrap().is_empty());
}

#[test]
fn test_snapshot_保留数量() {
    let env = setup();
    env.state.config_api.set_snapshot_retention(2).unwrap();
    let snapshot_api = &env.state.snapshot_api;

    for description in ["s1", "s2", "s3"] {
        snapshot_api.take_snapshot(description).unwrap();
    }

    let descriptions: Vec<String> = snapshot_api
        .list_snapshots()
        .unwrap()
        .into_iter()
        .map(|h| h.description)
        .collect();
    assert_eq!(descriptions, vec!["s2".to_string(), "s3".to_string()]);

    assert!(matches!(
        env.state.config_api.set_snapshot_retention(0),
        Err(ApiError::InvalidInput(_))
    ));
}

#[test]
fn test_delete_snapshot() {
    let env = setup();
    let snapshot_api = &env.state.snapshot_api;
    let header = snapshot_api.take_snapshot("to delete").unwrap();

    snapshot_api.delete_snapshot(&header.id).unwrap();
    assert!(snapshot_api.list_snapshots().unwrap().is_empty());
    assert!(matches!(
        snapshot_api.get_snapshot(&header.id),
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        snapshot_api.delete_snapshot(&header.id),
        Err(ApiError::NotFound(_))
    ));
}

#[test]
fn test_completion_history_与趋势() {
    let env = setup();
    let snapshot_api = &env.state.snapshot_api;

    snapshot_api.take_snapshot("baseline").unwrap();
    assert!(snapshot_api.predict_trend().unwrap().is_none());

    env.seed_scores().unwrap();
    snapshot_api.take_snapshot("after training").unwrap();

    let history = snapshot_api.completion_history().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].description, "baseline");
    assert!(approx(history[0].completion_rate, 0.0));
    assert!(approx(history[1].completion_rate, 70.37));

    // 两点回归: 预测值超过 100 时截断
    let trend = snapshot_api.predict_trend().unwrap().expect("应有趋势");
    assert_eq!(trend.points, 2);
    assert!(approx(trend.current, 70.37));
    assert!(approx(trend.predicted, 100.0));
    assert_eq!(trend.trend, TrendDirection::Up);

    let dashboard = env.state.dashboard_api.team_dashboard(false).unwrap();
    assert_eq!(dashboard.insights[0].kind, InsightKind::Positive);
    assert_eq!(dashboard.trend.map(|t| t.trend), Some(TrendDirection::Up));
}

#[test]
fn test_predict_trend_下降() {
    let env = setup();
    env.seed_scores().unwrap();
    let snapshot_api = &env.state.snapshot_api;
    snapshot_api.take_snapshot("high").unwrap();

    let keys: Vec<String> = ["E1|PA1|M1|C1", "E1|PA1|M1|C2", "E1|PA1|M2|C3"]
        .iter()
        .map(|k| k.to_string())
        .collect();
    env.state.assessment_api.bulk_set_score(&keys, 0, "lead").unwrap();
    snapshot_api.take_snapshot("low").unwrap();

    let trend = snapshot_api.predict_trend().unwrap().expect("应有趋势");
    assert!(trend.slope < 0.0);
    assert_eq!(trend.trend, TrendDirection::Down);
}

#[test]
fn test_snapshot_重启后保留() {
    let env = setup();
    env.state.snapshot_api.take_snapshot("persisted").unwrap();

    let reopened = env.reopen().expect("重新打开失败");
    let headers = reopened.snapshot_api.list_snapshots().unwrap();
    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].description, "persisted");
}

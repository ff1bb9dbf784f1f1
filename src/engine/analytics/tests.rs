use super::*;
use crate::domain::assessment::{AssessmentKey, AssessmentLedger};
use crate::domain::entity::{Competency, Engineer, EntityCatalog, Machine, ProductionArea};
use crate::domain::types::{GapPriority, InsightKind, Shift, TrainingPriority, TrendDirection};
use crate::engine::scoring::ScoreDistribution;
use crate::engine::trend::predict_trend;
use std::collections::{BTreeMap, BTreeSet};

// ==========================================
// 测试辅助函数
// ==========================================

/// Filling 区域:
/// - M1 Filler (importance=2): C1 Setup, C2 CIP
/// - M2 Capper (importance=5): C3 Torque
///
/// 评分:
/// - Alice(A): 3 / 3 / 3
/// - Bob(B):   0 / 1 / 3
/// - Carol(A): 3 / 0 / 3
fn team_fixture() -> (EntityCatalog, AssessmentLedger) {
    let mut catalog = EntityCatalog::new();
    catalog
        .add_area(
            ProductionArea::new("PA1", "Filling")
                .with_machine(
                    Machine::new("M1", "Filler", 2)
                        .with_competency(Competency::new("C1", "Setup"))
                        .with_competency(Competency::new("C2", "CIP")),
                )
                .with_machine(Machine::new("M2", "Capper", 5).with_competency(Competency::new("C3", "Torque"))),
        )
        .unwrap();
    catalog.add_engineer(Engineer::new("E1", "Alice", Shift::A)).unwrap();
    catalog.add_engineer(Engineer::new("E2", "Bob", Shift::B)).unwrap();
    catalog.add_engineer(Engineer::new("E3", "Carol", Shift::A)).unwrap();

    let mut ledger = AssessmentLedger::default();
    let scores = [
        ("E1", "M1", "C1", 3),
        ("E1", "M1", "C2", 3),
        ("E1", "M2", "C3", 3),
        ("E2", "M1", "C1", 0),
        ("E2", "M1", "C2", 1),
        ("E2", "M2", "C3", 3),
        ("E3", "M1", "C1", 3),
        ("E3", "M2", "C3", 3),
    ];
    for (engineer, machine, competency, score) in scores {
        ledger
            .set_score(&catalog, AssessmentKey::new(engineer, "PA1", machine, competency), score, "lead")
            .unwrap();
    }
    (catalog, ledger)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.05
}

// ==========================================
// 技能缺口
// ==========================================

#[test]
fn test_skills_gap_sorted_and_thresholded() {
    let (catalog, ledger) = team_fixture();
    let engine = AnalyticsEngine::new(&catalog, &ledger);
    let rows = engine.skills_gap(None);

    // C3 平均 3 分，无缺口
    let ids: Vec<_> = rows.iter().map(|r| r.competency_id.as_str()).collect();
    assert_eq!(ids, vec!["C2", "C1"]);

    assert!(approx(rows[0].current_avg, 1.333));
    assert!(approx(rows[0].gap, 1.667));
    assert_eq!(rows[0].priority, GapPriority::Medium);
    assert_eq!(rows[0].target, 3);

    assert!(approx(rows[1].gap, 1.0));
    assert_eq!(rows[1].priority, GapPriority::Low);

    for pair in rows.windows(2) {
        assert!(pair[0].gap >= pair[1].gap);
    }
    assert!(rows.iter().all(|r| r.gap > GAP_SIGNIFICANCE_THRESHOLD));
}

#[test]
fn test_skills_gap_high_priority_and_filter() {
    let (mut catalog, ledger) = team_fixture();
    catalog
        .add_area(
            ProductionArea::new("PA2", "Packing")
                .with_machine(Machine::new("M9", "Palletizer", 1).with_competency(Competency::new("C9", "Wrap"))),
        )
        .unwrap();
    let engine = AnalyticsEngine::new(&catalog, &ledger);

    let rows = engine.skills_gap(None);
    assert_eq!(rows[0].competency_id, "C9");
    assert_eq!(rows[0].priority, GapPriority::High);
    assert!(approx(rows[0].gap, 3.0));

    let packing = engine.skills_gap(Some("PA2"));
    assert_eq!(packing.len(), 1);
    assert!(engine.skills_gap(Some("NOPE")).is_empty());
}

#[test]
fn test_skills_gap_without_engineers() {
    let (mut catalog, ledger) = team_fixture();
    catalog.engineers.clear();
    assert!(AnalyticsEngine::new(&catalog, &ledger).skills_gap(None).is_empty());
}

// ==========================================
// 培训计划
// ==========================================

#[test]
fn test_training_plan_ordering_and_priority() {
    let (catalog, ledger) = team_fixture();
    let plan = AnalyticsEngine::new(&catalog, &ledger).training_plan("E2");

    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].competency_id, "C1");
    assert_eq!(plan[0].current_score, 0);
    assert_eq!(plan[0].priority, TrainingPriority::Critical);
    assert_eq!(plan[1].competency_id, "C2");
    assert_eq!(plan[1].current_score, 1);
    assert_eq!(plan[1].priority, TrainingPriority::High);
    assert_eq!(plan[1].target_score, 3);
}

#[test]
fn test_training_plan_completeness() {
    let (catalog, ledger) = team_fixture();
    let engine = AnalyticsEngine::new(&catalog, &ledger);

    for engineer in &catalog.engineers {
        let planned: BTreeSet<String> = engine
            .training_plan(&engineer.id)
            .into_iter()
            .map(|item| item.competency_id)
            .collect();
        let expected: BTreeSet<String> = catalog
            .competency_cells()
            .filter(|cell| engine.scoring().cell_score(&engineer.id, cell) < 2)
            .map(|cell| cell.competency.id.clone())
            .collect();
        assert_eq!(planned, expected, "engineer={}", engineer.id);
    }
    assert!(engine.training_plan("E1").is_empty());
}

// ==========================================
// 班次对比
// ==========================================

#[test]
fn test_shift_comparison() {
    let (catalog, ledger) = team_fixture();
    let shifts = AnalyticsEngine::new(&catalog, &ledger).shift_comparison(false);

    assert_eq!(shifts.len(), 2);
    assert_eq!(shifts[0].shift, Shift::A);
    assert_eq!(shifts[0].engineer_count, 2);
    // Alice 100%, Carol 66.7%
    assert!(approx(shifts[0].average_percent, 83.3));
    assert_eq!(shifts[0].best_engineer.as_deref(), Some("Alice"));
    assert_eq!(shifts[1].shift, Shift::B);
    assert!(approx(shifts[1].average_percent, 44.4));

    let spread = shift_spread(&shifts).unwrap();
    assert_eq!(spread.best, Shift::A);
    assert_eq!(spread.worst, Shift::B);
    assert!(approx(spread.gap, 38.9));
}

// ==========================================
// 洞察规则
// ==========================================

#[test]
fn test_generate_insights_all_rules_fire() {
    let (catalog, ledger) = team_fixture();
    let engine = AnalyticsEngine::new(&catalog, &ledger);
    let trend = predict_trend(&[40.0, 50.0, 60.0]).unwrap();

    let insights = engine.generate_insights(Some(&trend), false);
    let kinds: Vec<_> = insights.iter().map(|i| i.kind).collect();
    assert_eq!(
        kinds,
        vec![InsightKind::Positive, InsightKind::Alert, InsightKind::Warning, InsightKind::Positive]
    );
    assert!(insights[1].message.contains("A 班"));
    assert!(insights[1].message.contains("B 班"));
    assert!(insights[3].message.contains("Alice"));
}

#[test]
fn test_generate_insights_without_trend() {
    let (catalog, ledger) = team_fixture();
    let insights = AnalyticsEngine::new(&catalog, &ledger).generate_insights(None, false);
    assert_eq!(insights.len(), 3);
}

/// 两人不加权完成度相同，但分数落在重要度差异很大的机台上
fn weighting_fixture() -> (EntityCatalog, AssessmentLedger) {
    let mut catalog = EntityCatalog::new();
    catalog
        .add_area(
            ProductionArea::new("PA1", "Filling")
                .with_machine(Machine::new("M1", "Labeler", 1).with_competency(Competency::new("C1", "Reel")))
                .with_machine(Machine::new("M2", "Filler", 9).with_competency(Competency::new("C2", "Setup"))),
        )
        .unwrap();
    catalog.add_engineer(Engineer::new("E1", "Dave", Shift::A)).unwrap();
    catalog.add_engineer(Engineer::new("E2", "Erin", Shift::B)).unwrap();

    let mut ledger = AssessmentLedger::default();
    ledger
        .set_score(&catalog, AssessmentKey::new("E1", "PA1", "M1", "C1"), 3, "lead")
        .unwrap();
    ledger
        .set_score(&catalog, AssessmentKey::new("E2", "PA1", "M2", "C2"), 3, "lead")
        .unwrap();
    (catalog, ledger)
}

#[test]
fn test_generate_insights_follow_weighting() {
    let (catalog, ledger) = weighting_fixture();
    let engine = AnalyticsEngine::new(&catalog, &ledger);

    // 不加权: 两个班次均为 50%，只有培训需求告警
    let raw: Vec<_> = engine.generate_insights(None, false).iter().map(|i| i.kind).collect();
    assert_eq!(raw, vec![InsightKind::Warning]);

    // 加权: A 班 10%，B 班 90%，与加权班次对比一致
    let shifts = engine.shift_comparison(true);
    assert!(approx(shifts[0].average_percent, 10.0));
    assert!(approx(shifts[1].average_percent, 90.0));
    let weighted = engine.generate_insights(None, true);
    let kinds: Vec<_> = weighted.iter().map(|i| i.kind).collect();
    assert_eq!(kinds, vec![InsightKind::Alert, InsightKind::Warning, InsightKind::Positive]);
    assert!(weighted[2].message.contains("Erin"));

    let top = engine.top_performer(true).unwrap();
    assert_eq!(top.engineer_id, "E2");
    assert!(approx(top.percent, 90.0));
}

#[test]
fn test_trend_insight_rule() {
    let down = predict_trend(&[60.0, 50.0]).unwrap();
    let insight = trend_insight(Some(&down)).unwrap();
    assert_eq!(insight.kind, InsightKind::Warning);
    assert!(insight.message.contains("10.0"));

    let stable = predict_trend(&[100.0, 100.0]).unwrap();
    assert_eq!(stable.trend, TrendDirection::Stable);
    assert!(trend_insight(Some(&stable)).is_none());
    assert!(trend_insight(None).is_none());
}

#[test]
fn test_shift_gap_rule_threshold() {
    let summary = |shift, average_percent| ShiftSummary {
        shift,
        engineer_count: 1,
        average_percent,
        best_engineer: None,
    };
    assert!(shift_gap_insight(&[summary(Shift::A, 60.0), summary(Shift::C, 50.0)]).is_none());
    let alert = shift_gap_insight(&[summary(Shift::A, 60.5), summary(Shift::C, 50.0)]).unwrap();
    assert_eq!(alert.kind, InsightKind::Alert);
    assert!(shift_gap_insight(&[summary(Shift::Day, 90.0)]).is_none());
}

#[test]
fn test_training_priority_rule_threshold() {
    let distribution = |needs_training, total_cells| ScoreDistribution {
        counts: BTreeMap::new(),
        total_cells,
        needs_training,
    };
    assert!(training_priority_insight(&distribution(3, 10)).is_none());
    assert!(training_priority_insight(&distribution(4, 10)).is_some());
    assert!(training_priority_insight(&distribution(0, 0)).is_none());
}

#[test]
fn test_top_performer_rule_threshold() {
    let performer = |percent| TopPerformer {
        engineer_id: "E1".to_string(),
        name: "Alice".to_string(),
        percent,
    };
    assert!(top_performer_insight(Some(&performer(84.9))).is_none());
    let insight = top_performer_insight(Some(&performer(85.0))).unwrap();
    assert_eq!(insight.kind, InsightKind::Positive);
    assert!(top_performer_insight(None).is_none());
}

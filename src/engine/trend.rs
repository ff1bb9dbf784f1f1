// ==========================================
// 工程师能力矩阵系统 - 趋势预测
// ==========================================
// 输入: 按时间升序的快照完成度序列
// 算法: 最近 5 个点的最小二乘线性回归，x = 0..n-1
// 输出: 下一个点的预测值 (截断到 0~100)
// ==========================================
// 说明: 这是简单启发式，不做平滑、不给置信区间
// ==========================================

use crate::domain::snapshot::Snapshot;
use crate::domain::types::TrendDirection;
use crate::engine::scoring::ScoringEngine;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 回归使用的最近点数
pub const TREND_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPrediction {
    pub current: f64,
    pub predicted: f64,
    pub change: f64,
    pub trend: TrendDirection,
    pub slope: f64,
    pub intercept: f64,
    /// 参与回归的点数
    pub points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPoint {
    pub snapshot_id: String,
    pub timestamp: NaiveDateTime,
    pub description: String,
    pub completion_rate: f64,
}

/// 对完成度序列做线性回归预测
///
/// # 返回
/// - None: 少于 2 个点
pub fn predict_trend(rates: &[f64]) -> Option<TrendPrediction> {
    let window = &rates[rates.len().saturating_sub(TREND_WINDOW)..];
    let n = window.len();
    if n < 2 {
        return None;
    }

    let nf = n as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in window.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }

    // n >= 2 时 x 互不相同，分母恒正
    let slope = (nf * sum_xy - sum_x * sum_y) / (nf * sum_x2 - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / nf;
    let predicted = (slope * nf + intercept).clamp(0.0, 100.0);
    let current = window[n - 1];
    let change = predicted - current;

    Some(TrendPrediction {
        current,
        predicted,
        change,
        trend: TrendDirection::from_change(change),
        slope,
        intercept,
        points: n,
    })
}

/// 快照完成度 = 快照内全员全能力项 Σ得分 / Σ满分 × 100
pub fn completion_rate_of(snapshot: &Snapshot) -> f64 {
    let catalog = snapshot.data.catalog();
    let ledger = snapshot.data.ledger();
    ScoringEngine::new(&catalog, &ledger).team_completion().percent
}

/// 快照完成度时间序列（按时间升序）
pub fn completion_history(snapshots: &[Snapshot]) -> Vec<CompletionPoint> {
    let mut ordered: Vec<&Snapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|s| s.timestamp);
    ordered
        .into_iter()
        .map(|s| CompletionPoint {
            snapshot_id: s.id.clone(),
            timestamp: s.timestamp,
            description: s.description.clone(),
            completion_rate: completion_rate_of(s),
        })
        .collect()
}

/// 基于快照序列的趋势预测
pub fn predict_from_snapshots(snapshots: &[Snapshot]) -> Option<TrendPrediction> {
    let rates: Vec<f64> = completion_history(snapshots)
        .into_iter()
        .map(|p| p.completion_rate)
        .collect();
    predict_trend(&rates)
}

use super::AnalyticsEngine;
use crate::domain::entity::Engineer;
use crate::domain::types::Shift;
use crate::engine::scoring::EngineerScore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSummary {
    pub shift: Shift,
    pub engineer_count: usize,
    /// 班次内工程师完成度的算术平均
    pub average_percent: f64,
    pub best_engineer: Option<String>,
}

/// 最好与最差班次之差
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSpread {
    pub best: Shift,
    pub best_percent: f64,
    pub worst: Shift,
    pub worst_percent: f64,
    pub gap: f64,
}

/// 少于两个有人的班次时返回 None
pub fn shift_spread(summaries: &[ShiftSummary]) -> Option<ShiftSpread> {
    if summaries.len() < 2 {
        return None;
    }
    let best = summaries
        .iter()
        .max_by(|a, b| a.average_percent.total_cmp(&b.average_percent))?;
    let worst = summaries
        .iter()
        .min_by(|a, b| a.average_percent.total_cmp(&b.average_percent))?;
    Some(ShiftSpread {
        best: best.shift,
        best_percent: best.average_percent,
        worst: worst.shift,
        worst_percent: worst.average_percent,
        gap: best.average_percent - worst.average_percent,
    })
}

impl<'a> AnalyticsEngine<'a> {
    /// 班次对比；没有工程师的班次不列出
    pub fn shift_comparison(&self, weighted: bool) -> Vec<ShiftSummary> {
        let scored = self.scoring.score_all();
        Shift::ALL
            .iter()
            .filter_map(|&shift| {
                let members: Vec<_> = scored.iter().filter(|(e, _)| e.shift == shift).collect();
                if members.is_empty() {
                    return None;
                }
                let total: f64 = members.iter().map(|(_, s)| s.percent(weighted)).sum();
                let mut best: Option<&(&Engineer, EngineerScore)> = None;
                for &member in &members {
                    if best.map_or(true, |b| member.1.percent(weighted) > b.1.percent(weighted)) {
                        best = Some(member);
                    }
                }
                let best_engineer = best.map(|(e, _)| e.name.clone());
                Some(ShiftSummary {
                    shift,
                    engineer_count: members.len(),
                    average_percent: total / members.len() as f64,
                    best_engineer,
                })
            })
            .collect()
    }
}

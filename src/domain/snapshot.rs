// ==========================================
// 工程师能力矩阵系统 - 快照领域模型
// ==========================================
// 用途: 历史趋势分析的时间点副本
// 红线: 快照创建后不可变；只能由显式操作创建
// 保留数量由持久化层 (SnapshotRepository::prune) 执行
// ==========================================

use crate::domain::assessment::{AssessmentEntry, AssessmentKey, AssessmentLedger, HistoryPolicy};
use crate::domain::entity::{EntityCatalog, Engineer, ProductionArea};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 默认快照保留数量
pub const DEFAULT_SNAPSHOT_RETENTION: usize = 50;

// ==========================================
// SnapshotData - 快照内容 (深拷贝)
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotData {
    pub production_areas: Vec<ProductionArea>,
    pub engineers: Vec<Engineer>,
    pub assessments: BTreeMap<AssessmentKey, AssessmentEntry>,
}

impl SnapshotData {
    /// 从当前实体目录与台账拷贝
    pub fn capture(catalog: &EntityCatalog, ledger: &AssessmentLedger) -> Self {
        Self {
            production_areas: catalog.production_areas.clone(),
            engineers: catalog.engineers.clone(),
            assessments: ledger.entries().clone(),
        }
    }

    /// 还原为可计算的实体目录（只含区域与工程师）
    pub fn catalog(&self) -> EntityCatalog {
        EntityCatalog {
            production_areas: self.production_areas.clone(),
            engineers: self.engineers.clone(),
            ..EntityCatalog::default()
        }
    }

    /// 还原为只读台账
    pub fn ledger(&self) -> AssessmentLedger {
        AssessmentLedger::from_entries(self.assessments.clone(), HistoryPolicy::default())
    }
}

// ==========================================
// Snapshot - 快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    pub timestamp: NaiveDateTime,
    pub description: String,
    pub data: SnapshotData,
}

impl Snapshot {
    pub fn capture(
        description: &str,
        catalog: &EntityCatalog,
        ledger: &AssessmentLedger,
        at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: at,
            description: description.to_string(),
            data: SnapshotData::capture(catalog, ledger),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Competency, Machine};
    use crate::domain::types::Shift;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn fixture() -> (EntityCatalog, AssessmentLedger) {
        let mut catalog = EntityCatalog::new();
        catalog
            .add_area(
                ProductionArea::new("PA1", "Filling")
                    .with_machine(Machine::new("M1", "Filler", 2).with_competency(Competency::new("C1", "Setup"))),
            )
            .unwrap();
        catalog.add_engineer(Engineer::new("E1", "Alice", Shift::A)).unwrap();
        (catalog, AssessmentLedger::default())
    }

    #[test]
    fn test_snapshot_is_value_copy() {
        let (catalog, mut ledger) = fixture();
        let key = AssessmentKey::new("E1", "PA1", "M1", "C1");
        ledger.set_score(&catalog, key.clone(), 1, "lead").unwrap();

        let snapshot = Snapshot::capture("周报", &catalog, &ledger, at(1));
        ledger.set_score(&catalog, key.clone(), 3, "lead").unwrap();

        assert_eq!(snapshot.data.assessments[&key].score, 1);
        assert_eq!(snapshot.data.ledger().get_score(&key), 1);
        assert_eq!(snapshot.data.catalog().engineers.len(), 1);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let (catalog, ledger) = fixture();
        let snapshot = Snapshot::capture("月度", &catalog, &ledger, at(1));
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["data"]["productionAreas"].is_array());
        assert!(json["data"]["engineers"].is_array());
        assert!(json["data"]["assessments"].is_object());
    }
}

// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库 + AppState 组装 + 标准测试数据
// ==========================================
#![allow(dead_code)]

use competency_matrix::app::AppState;
use competency_matrix::domain::entity::{
    Competency, CoreSkill, CoreSkillCategory, Engineer, Machine, ProductionArea,
};
use competency_matrix::domain::types::Shift;
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是合法 UTF-8")?
        .to_string();
    Ok((temp_file, db_path))
}

/// 测试环境：临时库 + 完整 AppState
pub struct TestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub state: AppState,
}

impl TestEnv {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        competency_matrix::logging::init_test();
        let (temp_file, db_path) = create_test_db()?;
        let state = AppState::new(db_path.clone())?;
        Ok(Self {
            _temp_file: temp_file,
            db_path,
            state,
        })
    }

    /// 在同一数据库上重新组装 AppState（模拟重启）
    pub fn reopen(&self) -> Result<AppState, Box<dyn Error>> {
        Ok(AppState::new(self.db_path.clone())?)
    }

    /// 标准数据:
    /// - PA1 Filling: M1 Filler (importance=2): C1 Setup, C2 CIP
    ///                M2 Capper (importance=5): C3 Torque
    /// - 工程师: E1 Alice (A), E2 Bob (B), E3 Carol (A)
    /// - 核心技能: K1 Safety: S1 LOTO, S2 First aid
    pub fn seed(&self) -> Result<(), Box<dyn Error>> {
        let entity_api = &self.state.entity_api;
        entity_api.add_area(
            ProductionArea::new("PA1", "Filling")
                .with_machine(
                    Machine::new("M1", "Filler", 2)
                        .with_competency(Competency::new("C1", "Setup"))
                        .with_competency(Competency::new("C2", "CIP")),
                )
                .with_machine(Machine::new("M2", "Capper", 5).with_competency(Competency::new("C3", "Torque"))),
        )?;
        entity_api.add_engineer(Engineer::new("E1", "Alice", Shift::A))?;
        entity_api.add_engineer(Engineer::new("E2", "Bob", Shift::B))?;
        entity_api.add_engineer(Engineer::new("E3", "Carol", Shift::A))?;
        entity_api.add_core_category(
            CoreSkillCategory::new("K1", "Safety")
                .with_skill(CoreSkill::new("S1", "LOTO"))
                .with_skill(CoreSkill::new("S2", "First aid")),
        )?;
        Ok(())
    }

    /// 标准评分:
    /// - Alice: 3 / 3 / 3
    /// - Bob:   0 / 1 / 3
    /// - Carol: 3 / - / 3
    pub fn seed_scores(&self) -> Result<(), Box<dyn Error>> {
        let scores = [
            ("E1|PA1|M1|C1", 3),
            ("E1|PA1|M1|C2", 3),
            ("E1|PA1|M2|C3", 3),
            ("E2|PA1|M1|C1", 0),
            ("E2|PA1|M1|C2", 1),
            ("E2|PA1|M2|C3", 3),
            ("E3|PA1|M1|C1", 3),
            ("E3|PA1|M2|C3", 3),
        ];
        for (key, score) in scores {
            self.state.assessment_api.set_score(key, score, "lead")?;
        }
        Ok(())
    }
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.05
}

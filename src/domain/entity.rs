// ==========================================
// 工程师能力矩阵系统 - 实体模型
// ==========================================
// 层级: 生产区域 → 机台 → 能力项
// 平行体系: 核心技能分类 → 核心技能
// ==========================================
// 红线: 实体目录不持有评分，评分由 Ledger 管理
// ==========================================

use crate::domain::assessment::KEY_SEPARATOR;
use crate::domain::types::{Shift, UserRole, DEFAULT_MAX_SCORE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// 机台重要度下限
pub const MIN_IMPORTANCE: u32 = 1;
/// 机台重要度上限
pub const MAX_IMPORTANCE: u32 = 10;

// ==========================================
// 实体目录错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("实体ID重复: {entity} id={id}")]
    DuplicateId { entity: String, id: String },

    #[error("实体不存在: {entity} id={id}")]
    NotFound { entity: String, id: String },

    #[error("机台重要度越界: importance={0} (允许 1~10)")]
    InvalidImportance(u32),

    #[error("能力项满分无效: max_score={0} (必须 >= 1)")]
    InvalidMaxScore(u32),

    #[error("字段不能为空: {0}")]
    EmptyField(String),

    #[error("实体ID不能包含分隔符 '|': {field}={id}")]
    InvalidId { field: String, id: String },
}

fn not_found(entity: &str, id: &str) -> CatalogError {
    CatalogError::NotFound {
        entity: entity.to_string(),
        id: id.to_string(),
    }
}

fn duplicate(entity: &str, id: &str) -> CatalogError {
    CatalogError::DuplicateId {
        entity: entity.to_string(),
        id: id.to_string(),
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::EmptyField(field.to_string()));
    }
    Ok(())
}

/// 参与评分键拼接的ID: 非空且不含键分隔符
fn require_valid_id(field: &str, value: &str) -> Result<(), CatalogError> {
    require_non_empty(field, value)?;
    if value.contains(KEY_SEPARATOR) {
        return Err(CatalogError::InvalidId {
            field: field.to_string(),
            id: value.to_string(),
        });
    }
    Ok(())
}

// ==========================================
// Competency - 能力项
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competency {
    pub id: String,
    pub name: String,
    #[serde(default = "default_max_score")]
    pub max_score: u32, // 满分 (>= 1)
}

fn default_max_score() -> u32 {
    DEFAULT_MAX_SCORE
}

impl Competency {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_score: DEFAULT_MAX_SCORE,
        }
    }

    pub fn with_max_score(mut self, max_score: u32) -> Self {
        self.max_score = max_score;
        self
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        require_valid_id("competency.id", &self.id)?;
        if self.max_score < 1 {
            return Err(CatalogError::InvalidMaxScore(self.max_score));
        }
        Ok(())
    }
}

// ==========================================
// Machine - 机台
// ==========================================
// importance 为加权评分的权重因子
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: String,
    pub name: String,
    pub importance: u32, // 1~10
    #[serde(default)]
    pub competencies: Vec<Competency>,
}

impl Machine {
    pub fn new(id: impl Into<String>, name: impl Into<String>, importance: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            importance,
            competencies: Vec::new(),
        }
    }

    pub fn with_competency(mut self, competency: Competency) -> Self {
        self.competencies.push(competency);
        self
    }

    pub fn find_competency(&self, competency_id: &str) -> Option<&Competency> {
        self.competencies.iter().find(|c| c.id == competency_id)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        require_valid_id("machine.id", &self.id)?;
        if !(MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(&self.importance) {
            return Err(CatalogError::InvalidImportance(self.importance));
        }
        let mut seen = HashSet::new();
        for competency in &self.competencies {
            competency.validate()?;
            if !seen.insert(competency.id.as_str()) {
                return Err(duplicate("Competency", &competency.id));
            }
        }
        Ok(())
    }
}

// ==========================================
// ProductionArea - 生产区域
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionArea {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub machines: Vec<Machine>,
}

impl ProductionArea {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            machines: Vec::new(),
        }
    }

    pub fn with_machine(mut self, machine: Machine) -> Self {
        self.machines.push(machine);
        self
    }

    pub fn find_machine(&self, machine_id: &str) -> Option<&Machine> {
        self.machines.iter().find(|m| m.id == machine_id)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        require_valid_id("area.id", &self.id)?;
        let mut seen = HashSet::new();
        for machine in &self.machines {
            machine.validate()?;
            if !seen.insert(machine.id.as_str()) {
                return Err(duplicate("Machine", &machine.id));
            }
        }
        Ok(())
    }
}

// ==========================================
// Engineer - 工程师
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Engineer {
    pub id: String,
    pub name: String,
    pub shift: Shift,
}

impl Engineer {
    pub fn new(id: impl Into<String>, name: impl Into<String>, shift: Shift) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shift,
        }
    }
}

// ==========================================
// 核心技能 (与机台无关)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreSkill {
    pub id: String,
    pub name: String,
    #[serde(default = "default_max_score")]
    pub max_score: u32,
}

impl CoreSkill {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_score: DEFAULT_MAX_SCORE,
        }
    }

    pub fn with_max_score(mut self, max_score: u32) -> Self {
        self.max_score = max_score;
        self
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        require_valid_id("skill.id", &self.id)?;
        if self.max_score < 1 {
            return Err(CatalogError::InvalidMaxScore(self.max_score));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreSkillCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub skills: Vec<CoreSkill>,
}

impl CoreSkillCategory {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            skills: Vec::new(),
        }
    }

    pub fn with_skill(mut self, skill: CoreSkill) -> Self {
        self.skills.push(skill);
        self
    }

    pub fn find_skill(&self, skill_id: &str) -> Option<&CoreSkill> {
        self.skills.iter().find(|s| s.id == skill_id)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        require_valid_id("category.id", &self.id)?;
        let mut seen = HashSet::new();
        for skill in &self.skills {
            skill.validate()?;
            if !seen.insert(skill.id.as_str()) {
                return Err(duplicate("CoreSkill", &skill.id));
            }
        }
        Ok(())
    }
}

// ==========================================
// User - 系统用户 (只做数据，不做认证)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub role: UserRole,
}

// ==========================================
// CompetencyCell - 遍历视图
// ==========================================
/// 自顶向下遍历时的一个能力项单元 (区域, 机台, 能力项)
#[derive(Debug, Clone, Copy)]
pub struct CompetencyCell<'a> {
    pub area: &'a ProductionArea,
    pub machine: &'a Machine,
    pub competency: &'a Competency,
}

// ==========================================
// EntityCatalog - 实体目录
// ==========================================
/// 实体目录：区域/机台/能力项、工程师、核心技能、用户
///
/// 只做 CRUD 与结构校验；删除区域级联删除其下机台与能力项，
/// 对应评分记录不同步清理（遍历始终从现存实体出发，孤儿记录不会进入汇总）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCatalog {
    #[serde(default)]
    pub production_areas: Vec<ProductionArea>,
    #[serde(default)]
    pub engineers: Vec<Engineer>,
    #[serde(default)]
    pub core_skill_categories: Vec<CoreSkillCategory>,
    #[serde(default)]
    pub users: Vec<User>,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn find_area(&self, area_id: &str) -> Option<&ProductionArea> {
        self.production_areas.iter().find(|a| a.id == area_id)
    }

    pub fn find_machine(&self, area_id: &str, machine_id: &str) -> Option<&Machine> {
        self.find_area(area_id)?.find_machine(machine_id)
    }

    pub fn find_competency(
        &self,
        area_id: &str,
        machine_id: &str,
        competency_id: &str,
    ) -> Option<&Competency> {
        self.find_machine(area_id, machine_id)?
            .find_competency(competency_id)
    }

    pub fn find_engineer(&self, engineer_id: &str) -> Option<&Engineer> {
        self.engineers.iter().find(|e| e.id == engineer_id)
    }

    pub fn find_core_category(&self, category_id: &str) -> Option<&CoreSkillCategory> {
        self.core_skill_categories.iter().find(|c| c.id == category_id)
    }

    pub fn find_core_skill(&self, category_id: &str, skill_id: &str) -> Option<&CoreSkill> {
        self.find_core_category(category_id)?.find_skill(skill_id)
    }

    pub fn find_user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == user_id)
    }

    /// 自顶向下遍历全部能力项
    pub fn competency_cells(&self) -> impl Iterator<Item = CompetencyCell<'_>> {
        self.production_areas.iter().flat_map(|area| {
            area.machines.iter().flat_map(move |machine| {
                machine.competencies.iter().map(move |competency| CompetencyCell {
                    area,
                    machine,
                    competency,
                })
            })
        })
    }

    /// 能力项总数
    pub fn competency_count(&self) -> usize {
        self.competency_cells().count()
    }

    // ==========================================
    // 生产区域 / 机台 / 能力项
    // ==========================================

    pub fn add_area(&mut self, area: ProductionArea) -> Result<(), CatalogError> {
        area.validate()?;
        if self.find_area(&area.id).is_some() {
            return Err(duplicate("ProductionArea", &area.id));
        }
        self.production_areas.push(area);
        Ok(())
    }

    pub fn rename_area(&mut self, area_id: &str, name: &str) -> Result<(), CatalogError> {
        let area = self.area_mut(area_id)?;
        area.name = name.to_string();
        Ok(())
    }

    /// 删除区域（级联删除机台与能力项）
    pub fn remove_area(&mut self, area_id: &str) -> Result<ProductionArea, CatalogError> {
        let index = self
            .production_areas
            .iter()
            .position(|a| a.id == area_id)
            .ok_or_else(|| not_found("ProductionArea", area_id))?;
        Ok(self.production_areas.remove(index))
    }

    pub fn add_machine(&mut self, area_id: &str, machine: Machine) -> Result<(), CatalogError> {
        machine.validate()?;
        let area = self.area_mut(area_id)?;
        if area.find_machine(&machine.id).is_some() {
            return Err(duplicate("Machine", &machine.id));
        }
        area.machines.push(machine);
        Ok(())
    }

    pub fn set_machine_importance(
        &mut self,
        area_id: &str,
        machine_id: &str,
        importance: u32,
    ) -> Result<(), CatalogError> {
        if !(MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(&importance) {
            return Err(CatalogError::InvalidImportance(importance));
        }
        self.machine_mut(area_id, machine_id)?.importance = importance;
        Ok(())
    }

    pub fn remove_machine(&mut self, area_id: &str, machine_id: &str) -> Result<Machine, CatalogError> {
        let area = self.area_mut(area_id)?;
        let index = area
            .machines
            .iter()
            .position(|m| m.id == machine_id)
            .ok_or_else(|| not_found("Machine", machine_id))?;
        Ok(area.machines.remove(index))
    }

    pub fn add_competency(
        &mut self,
        area_id: &str,
        machine_id: &str,
        competency: Competency,
    ) -> Result<(), CatalogError> {
        competency.validate()?;
        let machine = self.machine_mut(area_id, machine_id)?;
        if machine.find_competency(&competency.id).is_some() {
            return Err(duplicate("Competency", &competency.id));
        }
        machine.competencies.push(competency);
        Ok(())
    }

    pub fn remove_competency(
        &mut self,
        area_id: &str,
        machine_id: &str,
        competency_id: &str,
    ) -> Result<Competency, CatalogError> {
        let machine = self.machine_mut(area_id, machine_id)?;
        let index = machine
            .competencies
            .iter()
            .position(|c| c.id == competency_id)
            .ok_or_else(|| not_found("Competency", competency_id))?;
        Ok(machine.competencies.remove(index))
    }

    // ==========================================
    // 工程师
    // ==========================================

    pub fn add_engineer(&mut self, engineer: Engineer) -> Result<(), CatalogError> {
        require_valid_id("engineer.id", &engineer.id)?;
        if self.find_engineer(&engineer.id).is_some() {
            return Err(duplicate("Engineer", &engineer.id));
        }
        self.engineers.push(engineer);
        Ok(())
    }

    pub fn set_engineer_shift(&mut self, engineer_id: &str, shift: Shift) -> Result<(), CatalogError> {
        let engineer = self
            .engineers
            .iter_mut()
            .find(|e| e.id == engineer_id)
            .ok_or_else(|| not_found("Engineer", engineer_id))?;
        engineer.shift = shift;
        Ok(())
    }

    pub fn remove_engineer(&mut self, engineer_id: &str) -> Result<Engineer, CatalogError> {
        let index = self
            .engineers
            .iter()
            .position(|e| e.id == engineer_id)
            .ok_or_else(|| not_found("Engineer", engineer_id))?;
        Ok(self.engineers.remove(index))
    }

    // ==========================================
    // 核心技能
    // ==========================================

    pub fn add_core_category(&mut self, category: CoreSkillCategory) -> Result<(), CatalogError> {
        category.validate()?;
        if self.find_core_category(&category.id).is_some() {
            return Err(duplicate("CoreSkillCategory", &category.id));
        }
        self.core_skill_categories.push(category);
        Ok(())
    }

    pub fn add_core_skill(&mut self, category_id: &str, skill: CoreSkill) -> Result<(), CatalogError> {
        skill.validate()?;
        let category = self
            .core_skill_categories
            .iter_mut()
            .find(|c| c.id == category_id)
            .ok_or_else(|| not_found("CoreSkillCategory", category_id))?;
        if category.find_skill(&skill.id).is_some() {
            return Err(duplicate("CoreSkill", &skill.id));
        }
        category.skills.push(skill);
        Ok(())
    }

    pub fn remove_core_category(&mut self, category_id: &str) -> Result<CoreSkillCategory, CatalogError> {
        let index = self
            .core_skill_categories
            .iter()
            .position(|c| c.id == category_id)
            .ok_or_else(|| not_found("CoreSkillCategory", category_id))?;
        Ok(self.core_skill_categories.remove(index))
    }

    // ==========================================
    // 用户
    // ==========================================

    pub fn add_user(&mut self, user: User) -> Result<(), CatalogError> {
        require_non_empty("user.username", &user.username)?;
        if self.find_user(&user.id).is_some() || self.users.iter().any(|u| u.username == user.username) {
            return Err(duplicate("User", &user.id));
        }
        self.users.push(user);
        Ok(())
    }

    pub fn remove_user(&mut self, user_id: &str) -> Result<User, CatalogError> {
        let index = self
            .users
            .iter()
            .position(|u| u.id == user_id)
            .ok_or_else(|| not_found("User", user_id))?;
        Ok(self.users.remove(index))
    }

    // ==========================================
    // 内部可变访问
    // ==========================================

    fn area_mut(&mut self, area_id: &str) -> Result<&mut ProductionArea, CatalogError> {
        self.production_areas
            .iter_mut()
            .find(|a| a.id == area_id)
            .ok_or_else(|| not_found("ProductionArea", area_id))
    }

    fn machine_mut(&mut self, area_id: &str, machine_id: &str) -> Result<&mut Machine, CatalogError> {
        self.area_mut(area_id)?
            .machines
            .iter_mut()
            .find(|m| m.id == machine_id)
            .ok_or_else(|| not_found("Machine", machine_id))
    }
}

// ==========================================
// 工程师能力矩阵系统 - 实体管理 API
// ==========================================
// 职责: 区域/机台/能力项、工程师、核心技能、用户的维护
// 流程: 加载目录 → 内存修改（含结构校验）→ 整体保存
// ==========================================
// 删除区域/机台/能力项/工程师不清理评分记录，
// 孤儿记录通过 AssessmentApi::purge_orphans 显式清理
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::domain::entity::{
    CatalogError, Competency, CoreSkill, CoreSkillCategory, Engineer, EntityCatalog, Machine,
    ProductionArea, User,
};
use crate::domain::types::Shift;
use crate::repository::EntityRepository;

pub struct EntityApi {
    entity_repo: Arc<EntityRepository>,
}

impl EntityApi {
    pub fn new(entity_repo: Arc<EntityRepository>) -> Self {
        Self { entity_repo }
    }

    /// 当前实体目录
    pub fn get_catalog(&self) -> ApiResult<EntityCatalog> {
        Ok(self.entity_repo.load_catalog()?)
    }

    /// 在目录上执行一次修改并保存；校验失败时不落库
    fn mutate<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut EntityCatalog) -> Result<T, CatalogError>,
    ) -> ApiResult<T> {
        let mut catalog = self.entity_repo.load_catalog()?;
        let result = match f(&mut catalog) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(operation, error = %e, "实体目录修改被拒绝");
                return Err(e.into());
            }
        };
        self.entity_repo.save_catalog(&catalog)?;
        tracing::info!(operation, "实体目录已修改");
        Ok(result)
    }

    // ===== 生产区域 / 机台 / 能力项 =====

    pub fn add_area(&self, area: ProductionArea) -> ApiResult<()> {
        self.mutate("add_area", |c| c.add_area(area))
    }

    pub fn rename_area(&self, area_id: &str, name: &str) -> ApiResult<()> {
        self.mutate("rename_area", |c| c.rename_area(area_id, name))
    }

    /// 删除区域（级联删除其下机台与能力项）
    pub fn remove_area(&self, area_id: &str) -> ApiResult<ProductionArea> {
        self.mutate("remove_area", |c| c.remove_area(area_id))
    }

    pub fn add_machine(&self, area_id: &str, machine: Machine) -> ApiResult<()> {
        self.mutate("add_machine", |c| c.add_machine(area_id, machine))
    }

    pub fn set_machine_importance(&self, area_id: &str, machine_id: &str, importance: u32) -> ApiResult<()> {
        self.mutate("set_machine_importance", |c| {
            c.set_machine_importance(area_id, machine_id, importance)
        })
    }

    pub fn remove_machine(&self, area_id: &str, machine_id: &str) -> ApiResult<Machine> {
        self.mutate("remove_machine", |c| c.remove_machine(area_id, machine_id))
    }

    pub fn add_competency(&self, area_id: &str, machine_id: &str, competency: Competency) -> ApiResult<()> {
        self.mutate("add_competency", |c| c.add_competency(area_id, machine_id, competency))
    }

    pub fn remove_competency(&self, area_id: &str, machine_id: &str, competency_id: &str) -> ApiResult<Competency> {
        self.mutate("remove_competency", |c| {
            c.remove_competency(area_id, machine_id, competency_id)
        })
    }

    // ===== 工程师 =====

    pub fn add_engineer(&self, engineer: Engineer) -> ApiResult<()> {
        self.mutate("add_engineer", |c| c.add_engineer(engineer))
    }

    pub fn set_engineer_shift(&self, engineer_id: &str, shift: Shift) -> ApiResult<()> {
        self.mutate("set_engineer_shift", |c| c.set_engineer_shift(engineer_id, shift))
    }

    pub fn remove_engineer(&self, engineer_id: &str) -> ApiResult<Engineer> {
        self.mutate("remove_engineer", |c| c.remove_engineer(engineer_id))
    }

    // ===== 核心技能 =====

    pub fn add_core_category(&self, category: CoreSkillCategory) -> ApiResult<()> {
        self.mutate("add_core_category", |c| c.add_core_category(category))
    }

    pub fn add_core_skill(&self, category_id: &str, skill: CoreSkill) -> ApiResult<()> {
        self.mutate("add_core_skill", |c| c.add_core_skill(category_id, skill))
    }

    pub fn remove_core_category(&self, category_id: &str) -> ApiResult<CoreSkillCategory> {
        self.mutate("remove_core_category", |c| c.remove_core_category(category_id))
    }

    // ===== 用户 =====

    pub fn add_user(&self, user: User) -> ApiResult<()> {
        self.mutate("add_user", |c| c.add_user(user))
    }

    pub fn remove_user(&self, user_id: &str) -> ApiResult<User> {
        self.mutate("remove_user", |c| c.remove_user(user_id))
    }
}

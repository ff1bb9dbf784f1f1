// ==========================================
// 工程师能力矩阵系统 - 实体目录数据仓储
// ==========================================
// 表: production_area / machine / competency / engineer
//     core_skill_category / core_skill / app_user
// 红线: Repository 不含业务逻辑，结构校验由 EntityCatalog 负责
// ==========================================

use crate::domain::entity::{
    Competency, CoreSkill, CoreSkillCategory, Engineer, EntityCatalog, Machine, ProductionArea, User,
};
use crate::domain::types::{Shift, UserRole};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Transaction};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// EntityRepository - 实体目录仓储
// ==========================================
/// 整体读写实体目录
///
/// 目录规模小（区域/机台/能力项在百级），按整表替换保存，
/// 列表顺序通过 sort_order 列保持。
pub struct EntityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EntityRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 读取
    // ==========================================

    /// 加载完整实体目录
    pub fn load_catalog(&self) -> RepositoryResult<EntityCatalog> {
        let conn = self.get_conn()?;
        Ok(EntityCatalog {
            production_areas: load_areas(&conn)?,
            engineers: load_engineers(&conn)?,
            core_skill_categories: load_core_categories(&conn)?,
            users: load_users(&conn)?,
        })
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 事务内整体替换实体目录
    ///
    /// 评分表不受影响：被删除实体对应的评分记录保留为孤儿。
    pub fn save_catalog(&self, catalog: &EntityCatalog) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute_batch(
            r#"
            DELETE FROM competency;
            DELETE FROM machine;
            DELETE FROM production_area;
            DELETE FROM core_skill;
            DELETE FROM core_skill_category;
            DELETE FROM engineer;
            DELETE FROM app_user;
            "#,
        )?;

        insert_areas(&tx, &catalog.production_areas)?;
        insert_engineers(&tx, &catalog.engineers)?;
        insert_core_categories(&tx, &catalog.core_skill_categories)?;
        insert_users(&tx, &catalog.users)?;

        tx.commit()?;
        tracing::debug!(
            areas = catalog.production_areas.len(),
            engineers = catalog.engineers.len(),
            categories = catalog.core_skill_categories.len(),
            users = catalog.users.len(),
            "实体目录已保存"
        );
        Ok(())
    }
}

// ==========================================
// 行映射辅助函数
// ==========================================

fn parse_shift(raw: &str) -> RepositoryResult<Shift> {
    raw.parse().map_err(|message| RepositoryError::FieldValueError {
        field: "engineer.shift".to_string(),
        message,
    })
}

fn parse_role(raw: &str) -> RepositoryResult<UserRole> {
    raw.parse().map_err(|message| RepositoryError::FieldValueError {
        field: "app_user.role".to_string(),
        message,
    })
}

fn load_areas(conn: &Connection) -> RepositoryResult<Vec<ProductionArea>> {
    let mut competencies: HashMap<(String, String), Vec<Competency>> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT area_id, machine_id, competency_id, name, max_score
             FROM competency ORDER BY area_id, machine_id, sort_order",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                Competency {
                    id: row.get(2)?,
                    name: row.get(3)?,
                    max_score: row.get(4)?,
                },
            ))
        })?;
        for row in rows {
            let (area_id, machine_id, competency) = row?;
            competencies.entry((area_id, machine_id)).or_default().push(competency);
        }
    }

    let mut machines: HashMap<String, Vec<Machine>> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT area_id, machine_id, name, importance
             FROM machine ORDER BY area_id, sort_order",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
            ))
        })?;
        for row in rows {
            let (area_id, machine_id, name, importance) = row?;
            let mut machine = Machine::new(machine_id.clone(), name, importance);
            machine.competencies = competencies
                .remove(&(area_id.clone(), machine_id))
                .unwrap_or_default();
            machines.entry(area_id).or_default().push(machine);
        }
    }

    let mut stmt = conn.prepare("SELECT area_id, name FROM production_area ORDER BY sort_order")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
    let mut areas = Vec::new();
    for row in rows {
        let (area_id, name) = row?;
        let mut area = ProductionArea::new(area_id.clone(), name);
        area.machines = machines.remove(&area_id).unwrap_or_default();
        areas.push(area);
    }
    Ok(areas)
}

fn load_engineers(conn: &Connection) -> RepositoryResult<Vec<Engineer>> {
    let mut stmt = conn.prepare("SELECT engineer_id, name, shift FROM engineer ORDER BY sort_order")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;
    let mut engineers = Vec::new();
    for row in rows {
        let (id, name, shift) = row?;
        engineers.push(Engineer::new(id, name, parse_shift(&shift)?));
    }
    Ok(engineers)
}

fn load_core_categories(conn: &Connection) -> RepositoryResult<Vec<CoreSkillCategory>> {
    let mut skills: HashMap<String, Vec<CoreSkill>> = HashMap::new();
    {
        let mut stmt = conn.prepare(
            "SELECT category_id, skill_id, name, max_score
             FROM core_skill ORDER BY category_id, sort_order",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                CoreSkill {
                    id: row.get(1)?,
                    name: row.get(2)?,
                    max_score: row.get(3)?,
                },
            ))
        })?;
        for row in rows {
            let (category_id, skill) = row?;
            skills.entry(category_id).or_default().push(skill);
        }
    }

    let mut stmt = conn.prepare("SELECT category_id, name FROM core_skill_category ORDER BY sort_order")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
    let mut categories = Vec::new();
    for row in rows {
        let (category_id, name) = row?;
        let mut category = CoreSkillCategory::new(category_id.clone(), name);
        category.skills = skills.remove(&category_id).unwrap_or_default();
        categories.push(category);
    }
    Ok(categories)
}

fn load_users(conn: &Connection) -> RepositoryResult<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, username, display_name, role FROM app_user ORDER BY sort_order",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;
    let mut users = Vec::new();
    for row in rows {
        let (id, username, display_name, role) = row?;
        users.push(User {
            id,
            username,
            display_name,
            role: parse_role(&role)?,
        });
    }
    Ok(users)
}

fn insert_areas(tx: &Transaction<'_>, areas: &[ProductionArea]) -> RepositoryResult<()> {
    let mut area_stmt =
        tx.prepare("INSERT INTO production_area (area_id, name, sort_order) VALUES (?1, ?2, ?3)")?;
    let mut machine_stmt = tx.prepare(
        "INSERT INTO machine (area_id, machine_id, name, importance, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let mut competency_stmt = tx.prepare(
        "INSERT INTO competency (area_id, machine_id, competency_id, name, max_score, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    for (area_order, area) in areas.iter().enumerate() {
        area_stmt.execute(params![area.id, area.name, area_order as i64])?;
        for (machine_order, machine) in area.machines.iter().enumerate() {
            machine_stmt.execute(params![
                area.id,
                machine.id,
                machine.name,
                machine.importance,
                machine_order as i64
            ])?;
            for (competency_order, competency) in machine.competencies.iter().enumerate() {
                competency_stmt.execute(params![
                    area.id,
                    machine.id,
                    competency.id,
                    competency.name,
                    competency.max_score,
                    competency_order as i64
                ])?;
            }
        }
    }
    Ok(())
}

fn insert_engineers(tx: &Transaction<'_>, engineers: &[Engineer]) -> RepositoryResult<()> {
    let mut stmt =
        tx.prepare("INSERT INTO engineer (engineer_id, name, shift, sort_order) VALUES (?1, ?2, ?3, ?4)")?;
    for (order, engineer) in engineers.iter().enumerate() {
        stmt.execute(params![engineer.id, engineer.name, engineer.shift.to_string(), order as i64])?;
    }
    Ok(())
}

fn insert_core_categories(tx: &Transaction<'_>, categories: &[CoreSkillCategory]) -> RepositoryResult<()> {
    let mut category_stmt =
        tx.prepare("INSERT INTO core_skill_category (category_id, name, sort_order) VALUES (?1, ?2, ?3)")?;
    let mut skill_stmt = tx.prepare(
        "INSERT INTO core_skill (category_id, skill_id, name, max_score, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (category_order, category) in categories.iter().enumerate() {
        category_stmt.execute(params![category.id, category.name, category_order as i64])?;
        for (skill_order, skill) in category.skills.iter().enumerate() {
            skill_stmt.execute(params![
                category.id,
                skill.id,
                skill.name,
                skill.max_score,
                skill_order as i64
            ])?;
        }
    }
    Ok(())
}

fn insert_users(tx: &Transaction<'_>, users: &[User]) -> RepositoryResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO app_user (user_id, username, display_name, role, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (order, user) in users.iter().enumerate() {
        stmt.execute(params![
            user.id,
            user.username,
            user.display_name,
            user.role.to_string(),
            order as i64
        ])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, ensure_schema};

    fn repo() -> EntityRepository {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        EntityRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn sample_catalog() -> EntityCatalog {
        let mut catalog = EntityCatalog::new();
        catalog
            .add_area(
                ProductionArea::new("PA2", "Packing")
                    .with_machine(Machine::new("M9", "Palletizer", 1).with_competency(Competency::new("C9", "Wrap"))),
            )
            .unwrap();
        catalog
            .add_area(
                ProductionArea::new("PA1", "Filling").with_machine(
                    Machine::new("M1", "Filler", 2)
                        .with_competency(Competency::new("C2", "CIP"))
                        .with_competency(Competency::new("C1", "Setup").with_max_score(5)),
                ),
            )
            .unwrap();
        catalog.add_engineer(Engineer::new("E2", "Bob", Shift::Day)).unwrap();
        catalog.add_engineer(Engineer::new("E1", "Alice", Shift::A)).unwrap();
        catalog
            .add_core_category(CoreSkillCategory::new("K1", "Safety").with_skill(CoreSkill::new("S1", "LOTO")))
            .unwrap();
        catalog
            .add_user(User {
                id: "U1".to_string(),
                username: "lead".to_string(),
                display_name: "Shift Lead".to_string(),
                role: UserRole::Assessor,
            })
            .unwrap();
        catalog
    }

    #[test]
    fn test_empty_database_loads_empty_catalog() {
        let catalog = repo().load_catalog().unwrap();
        assert_eq!(catalog, EntityCatalog::default());
    }

    #[test]
    fn test_save_and_load_preserves_order() {
        let repo = repo();
        let catalog = sample_catalog();
        repo.save_catalog(&catalog).unwrap();

        let loaded = repo.load_catalog().unwrap();
        assert_eq!(loaded, catalog);
        assert_eq!(loaded.production_areas[0].id, "PA2");
        assert_eq!(loaded.production_areas[1].machines[0].competencies[0].id, "C2");
    }

    #[test]
    fn test_save_replaces_previous_catalog() {
        let repo = repo();
        let mut catalog = sample_catalog();
        repo.save_catalog(&catalog).unwrap();

        catalog.remove_area("PA2").unwrap();
        catalog.remove_engineer("E2").unwrap();
        repo.save_catalog(&catalog).unwrap();

        let loaded = repo.load_catalog().unwrap();
        assert_eq!(loaded.production_areas.len(), 1);
        assert_eq!(loaded.engineers.len(), 1);
        assert!(loaded.find_machine("PA2", "M9").is_none());
    }
}

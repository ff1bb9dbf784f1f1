// ==========================================
// 工程师能力矩阵系统 - 领域类型定义
// ==========================================
// 评分区间: 0 ~ maxScore (默认 0~3)
// 胜任阈值: 2 分
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 胜任阈值：低于该分数视为需要培训
pub const COMPETENT_THRESHOLD: u32 = 2;

/// 能力项默认满分
pub const DEFAULT_MAX_SCORE: u32 = 3;

// ==========================================
// 班次 (Shift)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Shift {
    A,
    B,
    C,
    D,
    Day, // 常白班
}

impl Shift {
    /// 全部班次（按展示顺序）
    pub const ALL: [Shift; 5] = [Shift::A, Shift::B, Shift::C, Shift::D, Shift::Day];
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shift::A => write!(f, "A"),
            Shift::B => write!(f, "B"),
            Shift::C => write!(f, "C"),
            Shift::D => write!(f, "D"),
            Shift::Day => write!(f, "Day"),
        }
    }
}

impl FromStr for Shift {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Shift::A),
            "B" | "b" => Ok(Shift::B),
            "C" | "c" => Ok(Shift::C),
            "D" | "d" => Ok(Shift::D),
            "Day" | "DAY" | "day" => Ok(Shift::Day),
            other => Err(format!("未知班次: {}", other)),
        }
    }
}

// ==========================================
// 用户角色 (User Role)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,    // 管理员：维护区域/机台/能力项
    Assessor, // 评估人：录入评分
    Viewer,   // 只读
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "ADMIN"),
            UserRole::Assessor => write!(f, "ASSESSOR"),
            UserRole::Viewer => write!(f, "VIEWER"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(UserRole::Admin),
            "ASSESSOR" => Ok(UserRole::Assessor),
            "VIEWER" => Ok(UserRole::Viewer),
            other => Err(format!("未知角色: {}", other)),
        }
    }
}

// ==========================================
// 技能缺口优先级 (Gap Priority)
// ==========================================
// 顺序: Low < Medium < High
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GapPriority {
    Low,
    Medium,
    High,
}

impl GapPriority {
    /// gap > 2 → High, gap > 1 → Medium, 其余 Low
    pub fn from_gap(gap: f64) -> Self {
        if gap > 2.0 {
            GapPriority::High
        } else if gap > 1.0 {
            GapPriority::Medium
        } else {
            GapPriority::Low
        }
    }
}

impl fmt::Display for GapPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapPriority::Low => write!(f, "LOW"),
            GapPriority::Medium => write!(f, "MEDIUM"),
            GapPriority::High => write!(f, "HIGH"),
        }
    }
}

// ==========================================
// 培训优先级 (Training Priority)
// ==========================================
// 顺序: Medium < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainingPriority {
    Medium,
    High,
    Critical,
}

impl TrainingPriority {
    /// 0 分 → Critical, 1 分 → High, 其余 Medium
    ///
    /// 注意：培训计划只收录 < 2 分的项，当前 0~3 分制下 Medium 分支不可达，
    /// 保留给更宽的评分区间使用。
    pub fn from_score(score: u32) -> Self {
        match score {
            0 => TrainingPriority::Critical,
            1 => TrainingPriority::High,
            _ => TrainingPriority::Medium,
        }
    }
}

impl fmt::Display for TrainingPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingPriority::Medium => write!(f, "MEDIUM"),
            TrainingPriority::High => write!(f, "HIGH"),
            TrainingPriority::Critical => write!(f, "CRITICAL"),
        }
    }
}

// ==========================================
// 热力图色带 (Heatmap Band)
// ==========================================
// 阈值为设计常量: ≥80%, ≥60%, ≥40%, >0%, =0%
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeatmapBand {
    Untrained,  // 0%
    Beginner,   // 1-39%
    Developing, // 40-59%
    Proficient, // 60-79%
    Expert,     // 80-100%
}

impl HeatmapBand {
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 80.0 {
            HeatmapBand::Expert
        } else if percent >= 60.0 {
            HeatmapBand::Proficient
        } else if percent >= 40.0 {
            HeatmapBand::Developing
        } else if percent > 0.0 {
            HeatmapBand::Beginner
        } else {
            HeatmapBand::Untrained
        }
    }

    /// 图例文本
    pub fn label(&self) -> &'static str {
        match self {
            HeatmapBand::Expert => "80-100%",
            HeatmapBand::Proficient => "60-79%",
            HeatmapBand::Developing => "40-59%",
            HeatmapBand::Beginner => "1-39%",
            HeatmapBand::Untrained => "0%",
        }
    }
}

impl fmt::Display for HeatmapBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ==========================================
// 趋势方向 (Trend Direction)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

impl TrendDirection {
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            TrendDirection::Up
        } else if change < 0.0 {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Up => write!(f, "up"),
            TrendDirection::Down => write!(f, "down"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

// ==========================================
// 洞察类型 (Insight Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InsightKind {
    Positive, // 正向
    Warning,  // 警告
    Alert,    // 告警
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightKind::Positive => write!(f, "POSITIVE"),
            InsightKind::Warning => write!(f, "WARNING"),
            InsightKind::Alert => write!(f, "ALERT"),
        }
    }
}

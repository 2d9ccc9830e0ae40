//! 监督流程状态

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::Display;
use std::hash::BuildHasher;
use uuid::Uuid;

use crate::config::SupervisorConfig;
use crate::supervisor::error::SupervisorError;

/// 流水线阶段，只能向前推进
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Init,
    Analysis,
    Validation,
    Final,
    Done,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            Stage::Init => "init",
            Stage::Analysis => "analysis",
            Stage::Validation => "validation",
            Stage::Final => "final",
            Stage::Done => "done",
        };
        write!(f, "{}", str)
    }
}

/// 单个智能体步骤的可审计快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub step: usize,
    pub agent: String,
    pub stage: Stage,
    /// 已转换为JSON基本类型的结果
    pub result: Value,
    /// 该智能体截至此刻的全部笔记
    pub notes: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// 一次任务执行的全部进度
///
/// 只能通过 `step`、`log`、`record_decision`、`snapshot` 等方法修改，
/// 智能体本身从不直接接触状态。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorState {
    run_id: Uuid,
    task_input: String,
    stage: Stage,
    notes: BTreeMap<String, Vec<String>>,
    decisions: Vec<String>,
    history: Vec<SnapshotRecord>,
    total_steps: usize,
    retry_count: usize,
    max_steps: usize,
    max_retries: usize,
    current_agent: Option<String>,
    final_report: Option<String>,
    created_at: DateTime<Utc>,
}

impl SupervisorState {
    /// 使用默认上限创建状态
    pub fn new(task_input: impl Into<String>) -> Self {
        let defaults = SupervisorConfig::default();
        Self::with_limits(task_input, defaults.max_steps, defaults.max_retries)
    }

    pub fn with_limits(task_input: impl Into<String>, max_steps: usize, max_retries: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            task_input: task_input.into(),
            stage: Stage::default(),
            notes: BTreeMap::new(),
            decisions: Vec::new(),
            history: Vec::new(),
            total_steps: 0,
            retry_count: 0,
            max_steps,
            max_retries,
            current_agent: None,
            final_report: None,
            created_at: Utc::now(),
        }
    }

    /// 登记一个新步骤
    ///
    /// 若本步会使 `total_steps` 超过 `max_steps`，或 `retry_count` 已超过 `max_retries`，
    /// 返回致命错误且状态不变，因此 `total_steps` 恒等于成功调用 `step` 的次数。
    pub fn step(&mut self, agent: &str) -> Result<(), SupervisorError> {
        if self.retry_count > self.max_retries {
            return Err(SupervisorError::RetryLimitExceeded {
                agent: agent.to_string(),
                retry_count: self.retry_count,
                max_retries: self.max_retries,
            });
        }
        if self.total_steps + 1 > self.max_steps {
            return Err(SupervisorError::StepLimitExceeded {
                agent: agent.to_string(),
                total_steps: self.total_steps,
                max_steps: self.max_steps,
            });
        }

        self.total_steps += 1;
        self.current_agent = Some(agent.to_string());
        Ok(())
    }

    /// 智能体调用失败时计数
    pub fn register_failure(&mut self) {
        self.retry_count += 1;
    }

    /// 追加一条智能体笔记
    pub fn log(&mut self, agent: &str, text: impl Into<String>) {
        self.notes
            .entry(agent.to_string())
            .or_default()
            .push(text.into());
    }

    /// 追加一条决策记录
    pub fn record_decision(&mut self, text: impl Into<String>) {
        self.decisions.push(text.into());
    }

    /// 生成当前步骤的快照并写入历史
    pub fn snapshot<T>(&mut self, agent: &str, result: &T) -> SnapshotRecord
    where
        T: ToPrimitive + ?Sized,
    {
        let record = SnapshotRecord {
            step: self.total_steps,
            agent: agent.to_string(),
            stage: self.stage,
            result: result.to_primitive(),
            notes: self.notes_for(agent).to_vec(),
            timestamp: Utc::now(),
        };
        self.history.push(record.clone());
        record
    }

    /// 推进阶段，不允许回退
    pub fn advance_to(&mut self, stage: Stage) -> Result<(), SupervisorError> {
        if stage < self.stage {
            return Err(SupervisorError::StageRegression {
                from: self.stage,
                to: stage,
            });
        }
        self.stage = stage;
        Ok(())
    }

    /// 写入最终报告，只在第一次调用时生效
    pub fn set_final_report(&mut self, report: String) -> bool {
        if self.final_report.is_some() {
            return false;
        }
        self.final_report = Some(report);
        true
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn task_input(&self) -> &str {
        &self.task_input
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn notes(&self) -> &BTreeMap<String, Vec<String>> {
        &self.notes
    }

    /// 某个智能体的全部笔记，没有则为空切片
    pub fn notes_for(&self, agent: &str) -> &[String] {
        self.notes.get(agent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 某个智能体最近一条笔记
    pub fn latest_note(&self, agent: &str) -> Option<&str> {
        self.notes_for(agent).last().map(String::as_str)
    }

    pub fn decisions(&self) -> &[String] {
        &self.decisions
    }

    pub fn history(&self) -> &[SnapshotRecord] {
        &self.history
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn retry_count(&self) -> usize {
        self.retry_count
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn current_agent(&self) -> Option<&str> {
        self.current_agent.as_deref()
    }

    pub fn final_report(&self) -> Option<&str> {
        self.final_report.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// 可写入快照的结果，逐层转换为JSON基本类型
///
/// 字符串、数字、布尔原样保留；序列与映射逐元素递归；集合先排序再列出；
/// 映射的键和其他值取其字符串形式。转换对任何实现者都不会失败。
pub trait ToPrimitive {
    fn to_primitive(&self) -> Value;
}

impl ToPrimitive for Value {
    fn to_primitive(&self) -> Value {
        self.clone()
    }
}

impl ToPrimitive for str {
    fn to_primitive(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl ToPrimitive for String {
    fn to_primitive(&self) -> Value {
        Value::String(self.clone())
    }
}

impl ToPrimitive for bool {
    fn to_primitive(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! number_to_primitive {
    ($($ty:ty),*) => {
        $(
            impl ToPrimitive for $ty {
                fn to_primitive(&self) -> Value {
                    Value::from(*self)
                }
            }
        )*
    };
}

number_to_primitive!(i32, i64, u32, u64, usize, f32, f64);

impl ToPrimitive for DateTime<Utc> {
    fn to_primitive(&self) -> Value {
        Value::String(self.to_rfc3339())
    }
}

impl ToPrimitive for Uuid {
    fn to_primitive(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl<T: ToPrimitive + ?Sized> ToPrimitive for &T {
    fn to_primitive(&self) -> Value {
        (**self).to_primitive()
    }
}

impl<T: ToPrimitive> ToPrimitive for Option<T> {
    fn to_primitive(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToPrimitive::to_primitive)
    }
}

impl<T: ToPrimitive> ToPrimitive for [T] {
    fn to_primitive(&self) -> Value {
        Value::Array(self.iter().map(ToPrimitive::to_primitive).collect())
    }
}

impl<T: ToPrimitive> ToPrimitive for Vec<T> {
    fn to_primitive(&self) -> Value {
        self.as_slice().to_primitive()
    }
}

impl<T: ToPrimitive> ToPrimitive for BTreeSet<T> {
    fn to_primitive(&self) -> Value {
        Value::Array(self.iter().map(ToPrimitive::to_primitive).collect())
    }
}

impl<T: ToPrimitive + Ord, S: BuildHasher> ToPrimitive for HashSet<T, S> {
    fn to_primitive(&self) -> Value {
        let mut items: Vec<&T> = self.iter().collect();
        items.sort();
        Value::Array(items.into_iter().map(ToPrimitive::to_primitive).collect())
    }
}

impl<K: Display, V: ToPrimitive> ToPrimitive for BTreeMap<K, V> {
    fn to_primitive(&self) -> Value {
        entries_to_object(self.iter())
    }
}

impl<K: Display, V: ToPrimitive, S: BuildHasher> ToPrimitive for HashMap<K, V, S> {
    fn to_primitive(&self) -> Value {
        entries_to_object(self.iter())
    }
}

fn entries_to_object<'a, K, V>(entries: impl Iterator<Item = (&'a K, &'a V)>) -> Value
where
    K: Display + 'a,
    V: ToPrimitive + 'a,
{
    let map: Map<String, Value> = entries
        .map(|(key, value)| (key.to_string(), value.to_primitive()))
        .collect();
    Value::Object(map)
}

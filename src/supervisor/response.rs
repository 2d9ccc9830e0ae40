//! 智能体返回结果的统一表示与文本归一化

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::supervisor::state::ToPrimitive;

/// 结果为空时使用的固定文本
pub const NO_RESULT: &str = "(no result)";

/// 协作智能体的返回结果
///
/// 协作方可能返回纯文本、带 `messages` 或 `output` 的映射、带 `content` 的消息对象，
/// 或者一个序列。每种形态都是一个显式的变体，`summarise` 对其做穷尽匹配。
#[derive(Debug, Clone, PartialEq)]
pub enum AgentResponse {
    /// 没有任何结果
    Empty,
    /// 纯文本
    Text(String),
    /// `{"messages": [...]}`，取最后一条
    Messages(Vec<AgentResponse>),
    /// `{"output": ...}`
    Output(Box<AgentResponse>),
    /// 携带 `content` 的消息对象
    Content(MessageContent),
    /// 序列，取最后一个非空元素
    Sequence(Vec<AgentResponse>),
    /// 未知结构的JSON负载
    Structured(Value),
}

/// 消息对象的 `content` 字段
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<String>),
}

impl AgentResponse {
    /// 是否为空（空文本、空序列、空映射等）
    pub fn is_empty(&self) -> bool {
        match self {
            AgentResponse::Empty => true,
            AgentResponse::Text(text) => text.is_empty(),
            AgentResponse::Messages(_) | AgentResponse::Output(_) | AgentResponse::Content(_) => {
                false
            }
            AgentResponse::Sequence(items) => items.is_empty(),
            AgentResponse::Structured(value) => value_is_empty(value),
        }
    }

    /// 将任意形态的结果归一化为可打印的文本摘要
    ///
    /// 对任何输入都返回字符串，`Empty` 返回 [`NO_RESULT`]。
    pub fn summarise(&self) -> String {
        match self {
            AgentResponse::Empty => NO_RESULT.to_string(),
            AgentResponse::Text(text) => text.clone(),
            AgentResponse::Messages(messages) => match messages.last() {
                Some(last) => last.summarise(),
                None => self.stringify(),
            },
            AgentResponse::Output(output) => output.summarise(),
            AgentResponse::Content(MessageContent::Text(text)) if !text.trim().is_empty() => {
                text.clone()
            }
            AgentResponse::Content(MessageContent::Parts(parts)) => {
                let combined = join_parts(parts.iter().map(String::as_str));
                if combined.is_empty() {
                    self.stringify()
                } else {
                    combined
                }
            }
            AgentResponse::Content(MessageContent::Text(_)) => self.stringify(),
            AgentResponse::Sequence(items) => {
                match items.iter().filter(|item| !item.is_empty()).last() {
                    Some(last) => last.summarise(),
                    None => self.stringify(),
                }
            }
            AgentResponse::Structured(value) => summarise_value(value),
        }
    }

    fn stringify(&self) -> String {
        value_to_text(&self.to_primitive())
    }
}

/// 保持原始结构，供快照与引用提取使用
impl ToPrimitive for AgentResponse {
    fn to_primitive(&self) -> Value {
        match self {
            AgentResponse::Empty => Value::Null,
            AgentResponse::Text(text) => Value::String(text.clone()),
            AgentResponse::Messages(messages) => {
                let mut map = Map::new();
                map.insert(
                    "messages".to_string(),
                    Value::Array(messages.iter().map(AgentResponse::to_primitive).collect()),
                );
                Value::Object(map)
            }
            AgentResponse::Output(output) => {
                let mut map = Map::new();
                map.insert("output".to_string(), output.to_primitive());
                Value::Object(map)
            }
            AgentResponse::Content(content) => {
                let content = match content {
                    MessageContent::Text(text) => Value::String(text.clone()),
                    MessageContent::Parts(parts) => {
                        Value::Array(parts.iter().cloned().map(Value::String).collect())
                    }
                };
                let mut map = Map::new();
                map.insert("content".to_string(), content);
                Value::Object(map)
            }
            AgentResponse::Sequence(items) => {
                Value::Array(items.iter().map(AgentResponse::to_primitive).collect())
            }
            AgentResponse::Structured(value) => value.clone(),
        }
    }
}

impl Serialize for AgentResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_primitive().serialize(serializer)
    }
}

impl From<String> for AgentResponse {
    fn from(text: String) -> Self {
        AgentResponse::Text(text)
    }
}

impl From<&str> for AgentResponse {
    fn from(text: &str) -> Self {
        AgentResponse::Text(text.to_string())
    }
}

impl From<Value> for AgentResponse {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => AgentResponse::Empty,
            Value::String(text) => AgentResponse::Text(text),
            other => AgentResponse::Structured(other),
        }
    }
}

impl<T> From<Option<T>> for AgentResponse
where
    T: Into<AgentResponse>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AgentResponse::Empty)
    }
}

/// 对未知结构的JSON应用同样的拆包规则
fn summarise_value(value: &Value) -> String {
    match value {
        Value::Null => NO_RESULT.to_string(),
        Value::String(text) => text.clone(),
        Value::Object(map) => {
            if let Some(Value::Array(messages)) = map.get("messages")
                && let Some(last) = messages.last()
            {
                return summarise_value(last);
            }
            if let Some(output) = map.get("output")
                && !output.is_null()
            {
                return summarise_value(output);
            }
            match map.get("content") {
                Some(Value::String(text)) if !text.trim().is_empty() => text.clone(),
                Some(Value::Array(parts)) => {
                    let texts: Vec<String> = parts
                        .iter()
                        .filter(|part| !value_is_empty(part))
                        .map(value_to_text)
                        .collect();
                    let combined = join_parts(texts.iter().map(String::as_str));
                    if combined.is_empty() {
                        value.to_string()
                    } else {
                        combined
                    }
                }
                _ => value.to_string(),
            }
        }
        Value::Array(items) => match items.iter().filter(|item| !value_is_empty(item)).last() {
            Some(last) => summarise_value(last),
            None => value.to_string(),
        },
        Value::Bool(_) | Value::Number(_) => value.to_string(),
    }
}

fn join_parts<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn value_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(number) => number.as_f64() == Some(0.0),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

//! Typed views over remote payloads
//!
//! The service is loose about shapes: lists arrive bare or under a key, ids
//! arrive as numbers or strings, and balances sit at the top level or under
//! `user`. Every parser here tolerates those variations and skips entries it
//! cannot make sense of.

use serde_json::Value;

/// One reward task.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    /// `None` when the service omitted the flag; such tasks are not pending.
    pub completed: Option<bool>,
}

impl Task {
    pub fn is_pending(&self) -> bool {
        self.completed == Some(false)
    }
}

/// One purchasable lootbox.
#[derive(Debug, Clone, PartialEq)]
pub struct Lootbox {
    pub id: String,
    pub name: String,
    pub price: f64,
}

impl Lootbox {
    /// Menu line shown to the operator.
    pub fn describe(&self) -> String {
        format!("{} ({} coins)", self.name, self.price)
    }
}

/// Result of opening a lootbox.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenResult {
    pub prize: String,
    pub jackpot: bool,
}

fn list<'a>(payload: &'a Value, keys: &[&str]) -> &'a [Value] {
    if let Some(items) = payload.as_array() {
        return items;
    }
    keys.iter()
        .find_map(|key| payload.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn id_of(item: &Value) -> Option<String> {
    match item.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn parse_tasks(payload: &Value) -> Vec<Task> {
    list(payload, &["tasks", "data"])
        .iter()
        .filter_map(|item| {
            let id = id_of(item)?;
            Some(Task {
                title: item
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or(&id)
                    .to_string(),
                completed: item.get("completed").and_then(Value::as_bool),
                id,
            })
        })
        .collect()
}

pub fn parse_lootboxes(payload: &Value) -> Vec<Lootbox> {
    list(payload, &["lootboxes", "data"])
        .iter()
        .filter_map(|item| {
            let id = id_of(item)?;
            let price = item.get("price").and_then(number)?;
            Some(Lootbox {
                name: item
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(&id)
                    .to_string(),
                id,
                price,
            })
        })
        .collect()
}

/// Balance from an identity payload.
pub fn parse_balance(payload: &Value) -> Option<f64> {
    payload
        .get("balance")
        .or_else(|| payload.pointer("/user/balance"))
        .and_then(number)
}

pub fn parse_username(payload: &Value) -> Option<&str> {
    payload
        .get("username")
        .or_else(|| payload.pointer("/user/username"))
        .and_then(Value::as_str)
}

pub fn parse_open(payload: &Value) -> OpenResult {
    let prize = match payload.get("prize").or_else(|| payload.get("reward")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(obj)) => obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(obj.clone()).to_string()),
        Some(Value::Number(n)) => n.to_string(),
        _ => "nothing".to_string(),
    };
    OpenResult {
        prize,
        jackpot: payload
            .get("jackpot")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    }
}

/// Identifier of a freshly created token, for the log line.
pub fn token_id(payload: &Value) -> Option<String> {
    id_of(payload)
        .or_else(|| payload.get("token").and_then(id_of))
        .or_else(|| {
            payload
                .get("token")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
}

/// Look up a lootbox by id, then by case-insensitive name.
pub fn find_lootbox<'a>(catalogue: &'a [Lootbox], wanted: &str) -> Option<&'a Lootbox> {
    catalogue
        .iter()
        .find(|b| b.id == wanted)
        .or_else(|| catalogue.iter().find(|b| b.name.eq_ignore_ascii_case(wanted)))
}

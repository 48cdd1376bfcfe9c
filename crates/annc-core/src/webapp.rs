//! Registration form submitted from the hosted web app.

use serde_json::Value;

use crate::{formatting::escape_html, Result};

const NOT_PROVIDED: &str = "未提供";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormSubmission {
    pub date: String,
    pub name: String,
    pub rooms: String,
    pub telephone: String,
}

impl FormSubmission {
    /// Parse the web app payload. Missing or null fields become "未提供".
    pub fn parse(payload: &str) -> Result<Self> {
        let v: Value = serde_json::from_str(payload)?;
        Ok(Self {
            date: field(&v, "date"),
            name: field(&v, "name"),
            rooms: field(&v, "rooms"),
            telephone: field(&v, "telephone"),
        })
    }

    /// Summary sent to the operator chat (Telegram HTML).
    pub fn to_html(&self) -> String {
        format!(
            "📋 <b>新提交信息</b>\n\
             📅 日期: {}\n\
             👤 姓名: {}\n\
             🛏️ 房间数: {}\n\
             📞 电话: {}\n",
            escape_html(&self.date),
            escape_html(&self.name),
            escape_html(&self.rooms),
            escape_html(&self.telephone),
        )
    }
}

fn field(v: &Value, key: &str) -> String {
    match v.get(key) {
        None | Some(Value::Null) => NOT_PROVIDED.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

//! 收件人（干部）记录

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 干部记录，来自静态 `officers.json`
///
/// 除 `name`/`role`/`email` 外的字符串字段均视为社交链接（平台 → URL）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub role: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(flatten, deserialize_with = "string_fields")]
    pub social_links: BTreeMap<String, String>,
}

impl RecipientRecord {
    pub fn new(name: impl Into<String>, role: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            email: email.into(),
            social_links: BTreeMap::new(),
        }
    }

    /// 是否有可用的邮箱地址
    pub fn has_address(&self) -> bool {
        !self.email.trim().is_empty()
    }
}

/// `null` 与缺失同样视为空字符串
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// 只保留字符串值的额外字段（图片、序号等其他类型被忽略）
fn string_fields<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(k, v)| match v {
            serde_json::Value::String(s) => Some((k, s)),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_social_links() {
        let json = r#"{
            "name": "Ada",
            "role": "Chair",
            "email": "ada@example.com",
            "linkedin": "https://linkedin.com/in/ada",
            "facebook": "https://facebook.com/ada",
            "order": 1
        }"#;

        let record: RecipientRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "Ada");
        assert_eq!(record.email, "ada@example.com");
        assert_eq!(record.social_links.len(), 2);
        assert_eq!(
            record.social_links.get("linkedin").map(String::as_str),
            Some("https://linkedin.com/in/ada")
        );
        assert!(!record.social_links.contains_key("order"));
    }

    #[test]
    fn test_missing_email_defaults_to_empty() {
        let record: RecipientRecord =
            serde_json::from_str(r#"{"name": "Bob", "role": "Member"}"#).unwrap();
        assert!(record.email.is_empty());
        assert!(!record.has_address());
    }

    #[test]
    fn test_null_email_does_not_break_the_list() {
        let json = r#"[
            {"name": "Ada", "role": "Chair", "email": "ada@example.com"},
            {"name": "Bob", "role": null, "email": null, "linkedin": null}
        ]"#;

        let records: Vec<RecipientRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].has_address());
        assert_eq!(records[1].email, "");
        assert_eq!(records[1].role, "");
        assert!(!records[1].has_address());
        assert!(records[1].social_links.is_empty());
    }

    #[test]
    fn test_blank_email_has_no_address() {
        let record = RecipientRecord::new("Eve", "Treasurer", "   ");
        assert!(!record.has_address());
        assert!(RecipientRecord::new("Eve", "Treasurer", "eve@x.com").has_address());
    }
}

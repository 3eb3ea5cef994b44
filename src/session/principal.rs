use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The authenticated user as the backend describes it. Only non-sensitive
/// profile data; the session itself lives in an HTTP-only cookie.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Principal {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Look up a profile field by its wire name
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(self.id.clone()),
            "name" => self.name.clone().map(Value::String),
            "email" => self.email.clone().map(Value::String),
            "phone" => self.phone.clone().map(Value::String),
            "emailVerified" => Some(Value::Bool(self.email_verified)),
            "permissions" => Some(Value::from(self.permissions.clone())),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Every required field is present and non-empty
    pub fn is_profile_complete<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required
            .iter()
            .all(|field| self.field(field.as_ref()).is_some_and(|v| is_filled(&v)))
    }

    /// Shallow merge of profile changes returned by the backend
    pub fn merge(&mut self, changes: Principal) {
        if !changes.id.is_null() {
            self.id = changes.id;
        }
        if changes.name.is_some() {
            self.name = changes.name;
        }
        if changes.email.is_some() {
            self.email = changes.email;
        }
        if changes.phone.is_some() {
            self.phone = changes.phone;
        }
        if changes.email_verified {
            self.email_verified = true;
        }
        if !changes.permissions.is_empty() {
            self.permissions = changes.permissions;
        }
        self.extra.extend(changes.extra);
    }
}

fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

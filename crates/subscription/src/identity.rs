use std::fmt;

use common::{DashError, DashResult};

/// 当前登录用户（外部认证层给出的非空标识）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserIdentity(String);

impl UserIdentity {
    pub fn new(raw: &str) -> DashResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DashError::Unauthenticated("empty user identity".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// 外部给的可能缺失的标识；缺失即未登录
    pub fn from_optional(raw: Option<&str>) -> DashResult<Self> {
        match raw {
            Some(raw) => Self::new(raw),
            None => Err(DashError::Unauthenticated("no user identity supplied".to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

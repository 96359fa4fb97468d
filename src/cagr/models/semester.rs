use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Site-issued academic term identifier, e.g. `"20231"`. Treated as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Semester(String);

impl Semester {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Semester {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("semester identifier must not be empty")]
pub struct EmptySemester;

impl FromStr for Semester {
    type Err = EmptySemester;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmptySemester);
        }
        Ok(Self(s.to_owned()))
    }
}

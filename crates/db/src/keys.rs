//! Opaque course and block identifiers.
//!
//! Two spellings of a course key coexist in archived content: the deprecated
//! `org/course/run` form and `course-v1:org+course+run`. Keys remember which
//! spelling they were parsed from so that `Display` round-trips.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

const COURSE_PREFIX: &str = "course-v1:";
const BLOCK_PREFIX: &str = "block-v1:";
const LEGACY_BLOCK_PREFIX: &str = "i4x://";

fn is_valid_component(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseKey {
    org: String,
    course: String,
    run: String,
    deprecated: bool,
}

impl CourseKey {
    pub fn new(org: &str, course: &str, run: &str) -> Result<Self, KeyError> {
        if ![org, course, run].iter().all(|p| is_valid_component(p)) {
            return Err(KeyError::InvalidKey(format!("{org}+{course}+{run}")));
        }
        Ok(Self {
            org: org.to_string(),
            course: course.to_string(),
            run: run.to_string(),
            deprecated: false,
        })
    }

    pub fn parse(input: &str) -> Result<Self, KeyError> {
        let invalid = || KeyError::InvalidKey(input.to_string());

        let (parts, deprecated): (Vec<&str>, bool) = match input.strip_prefix(COURSE_PREFIX) {
            Some(rest) => (rest.split('+').collect(), false),
            None => (input.split('/').collect(), true),
        };

        match parts.as_slice() {
            [org, course, run] if [org, course, run].iter().all(|p| is_valid_component(p)) => {
                Ok(Self {
                    org: org.to_string(),
                    course: course.to_string(),
                    run: run.to_string(),
                    deprecated,
                })
            }
            _ => Err(invalid()),
        }
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn course(&self) -> &str {
        &self.course
    }

    pub fn run(&self) -> &str {
        &self.run
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Static-content location of a course asset.
    pub fn asset_key(&self, filename: &str) -> String {
        if self.deprecated {
            format!("/c4x/{}/{}/asset/{}", self.org, self.course, filename)
        } else {
            format!(
                "asset-v1:{}+{}+{}+type@asset+block@{}",
                self.org, self.course, self.run, filename
            )
        }
    }
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.deprecated {
            write!(f, "{}/{}/{}", self.org, self.course, self.run)
        } else {
            write!(f, "{COURSE_PREFIX}{}+{}+{}", self.org, self.course, self.run)
        }
    }
}

impl FromStr for CourseKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CourseKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CourseKey> for String {
    fn from(key: CourseKey) -> Self {
        key.to_string()
    }
}

/// Location of a single block inside a course.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UsageKey {
    course_key: CourseKey,
    block_type: String,
    block_id: String,
}

impl UsageKey {
    pub fn new(course_key: CourseKey, block_type: &str, block_id: &str) -> Result<Self, KeyError> {
        if !is_valid_component(block_type) || !is_valid_component(block_id) {
            return Err(KeyError::InvalidKey(format!("{block_type}@{block_id}")));
        }
        Ok(Self {
            course_key,
            block_type: block_type.to_string(),
            block_id: block_id.to_string(),
        })
    }

    pub fn parse(input: &str) -> Result<Self, KeyError> {
        let invalid = || KeyError::InvalidKey(input.to_string());

        if let Some(rest) = input.strip_prefix(BLOCK_PREFIX) {
            let parts: Vec<&str> = rest.split('+').collect();
            let [org, course, run, block_type, block_id] = parts.as_slice() else {
                return Err(invalid());
            };
            let block_type = block_type.strip_prefix("type@").ok_or_else(invalid)?;
            let block_id = block_id.strip_prefix("block@").ok_or_else(invalid)?;
            let course_key = CourseKey::new(org, course, run).map_err(|_| invalid())?;
            return Self::new(course_key, block_type, block_id).map_err(|_| invalid());
        }

        if let Some(rest) = input.strip_prefix(LEGACY_BLOCK_PREFIX) {
            let (path, run) = rest.rsplit_once('@').ok_or_else(invalid)?;
            let parts: Vec<&str> = path.split('/').collect();
            let [org, course, block_type, block_id] = parts.as_slice() else {
                return Err(invalid());
            };
            let course_key =
                CourseKey::parse(&format!("{org}/{course}/{run}")).map_err(|_| invalid())?;
            return Self::new(course_key, block_type, block_id).map_err(|_| invalid());
        }

        Err(invalid())
    }

    pub fn course_key(&self) -> &CourseKey {
        &self.course_key
    }

    pub fn block_type(&self) -> &str {
        &self.block_type
    }

    pub fn block_id(&self) -> &str {
        &self.block_id
    }
}

impl fmt::Display for UsageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ck = &self.course_key;
        if ck.deprecated {
            write!(
                f,
                "{LEGACY_BLOCK_PREFIX}{}/{}/{}/{}@{}",
                ck.org, ck.course, self.block_type, self.block_id, ck.run
            )
        } else {
            write!(
                f,
                "{BLOCK_PREFIX}{}+{}+{}+type@{}+block@{}",
                ck.org, ck.course, ck.run, self.block_type, self.block_id
            )
        }
    }
}

impl FromStr for UsageKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for UsageKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UsageKey> for String {
    fn from(key: UsageKey) -> Self {
        key.to_string()
    }
}

//! Keyed access to the members of an optimizer instance.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of a named optimizer member.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Attribute {
    /// Integer member (counters, codes, flags).
    Integer(i64),
    /// Boolean member.
    Boolean(bool),
    /// Textual member.
    Text(String),
    /// Axis lengths.
    Dims(Vec<usize>),
}

impl Attribute {
    /// Integer value, if this is an integer member.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Text value, if this is a textual member.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<usize> for Attribute {
    fn from(value: usize) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<i32> for Attribute {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for Attribute {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<bool> for Attribute {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<String> for Attribute {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
            Self::Dims(dims) => write!(f, "{dims:?}"),
        }
    }
}

/// Snapshot of every member of an optimizer instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Summary {
    /// Algorithm name.
    pub name: String,
    /// Algorithm description.
    pub description: String,
    /// Number of variables.
    pub size: usize,
    /// Axis lengths of the variables.
    pub dims: Vec<usize>,
    /// Single precision variables.
    pub single: bool,
    /// Algorithm flags.
    pub flags: u32,
    /// Code of the pending task.
    pub task: i32,
    /// Status code.
    pub status: i32,
    /// Status message.
    pub reason: String,
    /// Accepted iterations.
    pub iterations: usize,
    /// Objective evaluations.
    pub evaluations: usize,
    /// Restarts.
    pub restarts: usize,
    /// Projections onto the feasible set.
    pub projections: usize,
    /// Memorized steps, for limited memory methods.
    pub mem: Option<usize>,
}

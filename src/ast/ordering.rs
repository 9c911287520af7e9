use serde::{Deserialize, Serialize};

/// Sort direction of an ORDER BY key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Where NULLs land relative to non-null keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullOrdering {
    /// Whatever the database does natively.
    #[default]
    Default,
    First,
    Last,
}

/// Direction plus null placement for one ordering key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ordering {
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub nulls: NullOrdering,
}

impl Ordering {
    pub const fn asc() -> Self {
        Self {
            direction: Direction::Asc,
            nulls: NullOrdering::Default,
        }
    }

    pub const fn desc() -> Self {
        Self {
            direction: Direction::Desc,
            nulls: NullOrdering::Default,
        }
    }

    pub const fn nulls_first(self) -> Self {
        Self {
            nulls: NullOrdering::First,
            ..self
        }
    }

    pub const fn nulls_last(self) -> Self {
        Self {
            nulls: NullOrdering::Last,
            ..self
        }
    }

    pub fn is_desc(&self) -> bool {
        self.direction == Direction::Desc
    }

    /// Flip the direction, keeping null placement.
    pub fn reverse(self) -> Self {
        let direction = match self.direction {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        };
        Self { direction, ..self }
    }
}

impl std::fmt::Display for Ordering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.direction {
            Direction::Asc => write!(f, "asc")?,
            Direction::Desc => write!(f, "desc")?,
        }
        match self.nulls {
            NullOrdering::Default => Ok(()),
            NullOrdering::First => write!(f, " nulls first"),
            NullOrdering::Last => write!(f, " nulls last"),
        }
    }
}

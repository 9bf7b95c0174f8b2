//! Short food identifiers and their allocation.
//!
//! Food IDs are a single uppercase category prefix followed by a decimal
//! number without leading zeros: `B1`, `B2` for basic foods and `C1` for
//! composite foods. Numbers freed by removing a food are handed out again,
//! smallest first, before the counter moves on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::DiaryError;

/// Category of a food, which also determines its ID prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodKind {
    Basic,
    Composite,
}

impl FoodKind {
    pub const ALL: [FoodKind; 2] = [FoodKind::Basic, FoodKind::Composite];

    /// ID prefix for this category.
    pub fn prefix(&self) -> char {
        match self {
            FoodKind::Basic => 'B',
            FoodKind::Composite => 'C',
        }
    }

    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'B' => Some(FoodKind::Basic),
            'C' => Some(FoodKind::Composite),
            _ => None,
        }
    }
}

impl fmt::Display for FoodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoodKind::Basic => write!(f, "basic"),
            FoodKind::Composite => write!(f, "composite"),
        }
    }
}

/// A food identifier as stored and displayed.
///
/// Any string is accepted so that foods loaded from hand-edited files keep
/// their IDs; [`FoodId::parts`] tells whether the ID is well formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoodId(String);

impl FoodId {
    pub fn new(kind: FoodKind, number: u32) -> Self {
        Self(format!("{}{}", kind.prefix(), number))
    }

    /// Normalizes user input (`" b12 "` becomes `B12`).
    pub fn parse_input(input: &str) -> Self {
        Self(input.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits a well-formed ID into its category and number.
    pub fn parts(&self) -> Option<(FoodKind, u32)> {
        let mut chars = self.0.chars();
        let kind = FoodKind::from_prefix(chars.next()?)?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return None;
        }
        digits.parse().ok().map(|number| (kind, number))
    }

    pub fn kind(&self) -> Option<FoodKind> {
        self.parts().map(|(kind, _)| kind)
    }

    pub fn number(&self) -> Option<u32> {
        self.parts().map(|(_, number)| number)
    }

    /// Case-insensitive comparison, used when matching log entries.
    pub fn matches(&self, other: &FoodId) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    /// Ordering key: category, then number; malformed IDs sort last.
    pub(crate) fn sort_key(&self) -> (u8, u32, &str) {
        match self.parts() {
            Some((kind, number)) => (kind as u8, number, self.as_str()),
            None => (u8::MAX, u32::MAX, self.as_str()),
        }
    }
}

impl fmt::Display for FoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FoodId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FoodId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pool {
    // Wider than the ID number so the counter can sit one past `u32::MAX`.
    next: u64,
    recycled: BTreeSet<u32>,
}

impl Default for Pool {
    fn default() -> Self {
        Self {
            next: 1,
            recycled: BTreeSet::new(),
        }
    }
}

/// Issues and recycles food IDs per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdAllocator {
    basic: Pool,
    composite: Pool,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn pool_mut(&mut self, kind: FoodKind) -> &mut Pool {
        match kind {
            FoodKind::Basic => &mut self.basic,
            FoodKind::Composite => &mut self.composite,
        }
    }

    fn pool(&self, kind: FoodKind) -> &Pool {
        match kind {
            FoodKind::Basic => &self.basic,
            FoodKind::Composite => &self.composite,
        }
    }

    /// Returns the smallest recycled ID, or the next fresh one. Fails once
    /// every number of the category has been handed out.
    pub fn allocate(&mut self, kind: FoodKind) -> Result<FoodId, DiaryError> {
        let pool = self.pool_mut(kind);
        let number = match pool.recycled.pop_first() {
            Some(number) => number,
            None => {
                let number =
                    u32::try_from(pool.next).map_err(|_| DiaryError::IdsExhausted(kind))?;
                pool.next += 1;
                number
            }
        };
        Ok(FoodId::new(kind, number))
    }

    /// Makes an ID available again. Malformed IDs are ignored.
    pub fn recycle(&mut self, id: &FoodId) {
        match id.parts() {
            Some((kind, number)) => {
                self.pool_mut(kind).recycled.insert(number);
            }
            None => tracing::debug!("Not recycling malformed food ID '{}'", id),
        }
    }

    /// Records an ID that is already in use so the counter never reissues it.
    pub fn observe(&mut self, id: &FoodId) {
        if let Some((kind, number)) = id.parts() {
            let pool = self.pool_mut(kind);
            pool.recycled.remove(&number);
            let number = u64::from(number);
            if number >= pool.next {
                pool.next = number + 1;
            }
        }
    }

    /// The number the counter will hand out once no recycled IDs remain.
    pub fn next_number(&self, kind: FoodKind) -> u64 {
        self.pool(kind).next
    }

    pub fn recycled(&self, kind: FoodKind) -> impl Iterator<Item = u32> + '_ {
        self.pool(kind).recycled.iter().copied()
    }
}

// src/models/answer.rs

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Serialize, Serializer};

/// One of the four option slots of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Letter {
    A,
    B,
    C,
    D,
}

impl Letter {
    pub const ALL: [Letter; 4] = [Letter::A, Letter::B, Letter::C, Letter::D];

    pub fn as_str(self) -> &'static str {
        match self {
            Letter::A => "a",
            Letter::B => "b",
            Letter::C => "c",
            Letter::D => "d",
        }
    }

    /// Position of the option in the `option_a..option_d` columns.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Letter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLetter(pub String);

impl fmt::Display for InvalidLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not an option letter (a-d)", self.0)
    }
}

impl std::error::Error for InvalidLetter {}

impl FromStr for Letter {
    type Err = InvalidLetter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" => Ok(Letter::A),
            "b" => Ok(Letter::B),
            "c" => Ok(Letter::C),
            "d" => Ok(Letter::D),
            _ => Err(InvalidLetter(s.trim().to_string())),
        }
    }
}

/// A set of option letters, always iterated in ascending order.
///
/// The stored form is the comma-joined sorted letters (`"a,c"`); `encode` and
/// `decode` are the only places that know about it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LetterSet(BTreeSet<Letter>);

impl LetterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, letter: Letter) {
        self.0.insert(letter);
    }

    pub fn contains(&self, letter: Letter) -> bool {
        self.0.contains(&letter)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Letter> + '_ {
        self.0.iter().copied()
    }

    /// Parses each raw value as a letter; duplicates collapse.
    pub fn parse_all<I, S>(values: I) -> Result<Self, InvalidLetter>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        values
            .into_iter()
            .map(|v| v.as_ref().parse::<Letter>())
            .collect()
    }

    pub fn encode(&self) -> String {
        self.iter().map(Letter::as_str).collect::<Vec<_>>().join(",")
    }

    /// Decodes the stored form. Empty segments are rejected.
    pub fn decode(stored: &str) -> Result<Self, InvalidLetter> {
        if stored.trim().is_empty() {
            return Ok(Self::new());
        }
        Self::parse_all(stored.split(','))
    }
}

impl FromIterator<Letter> for LetterSet {
    fn from_iter<T: IntoIterator<Item = Letter>>(iter: T) -> Self {
        LetterSet(iter.into_iter().collect())
    }
}

impl Serialize for LetterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

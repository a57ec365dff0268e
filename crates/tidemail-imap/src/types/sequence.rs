//! Sequence sets for message ranges.

use std::str::FromStr;

use super::SeqNum;
use crate::Error;

/// Sequence set for specifying message ranges.
///
/// Covers the RFC 3501 `sequence-set` grammar: `1`, `1:10`, `5:*`, `*`,
/// and comma-joined combinations like `1:*,3,5:7`. Depending on the
/// command, the numbers are message sequence numbers or UIDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSet {
    /// Single sequence number.
    Single(SeqNum),
    /// Range of sequence numbers (inclusive).
    Range(SeqNum, SeqNum),
    /// Range from start to end of mailbox.
    RangeFrom(SeqNum),
    /// All messages (*).
    All,
    /// Multiple sequence specifications.
    Set(Vec<Self>),
}

impl SequenceSet {
    /// Creates a sequence set from a single number.
    #[must_use]
    pub fn single(n: u32) -> Option<Self> {
        SeqNum::new(n).map(Self::Single)
    }

    /// Creates a range sequence set.
    #[must_use]
    pub fn range(start: u32, end: u32) -> Option<Self> {
        Some(Self::Range(SeqNum::new(start)?, SeqNum::new(end)?))
    }
}

impl std::fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::RangeFrom(start) => write!(f, "{start}:*"),
            Self::All => write!(f, "*"),
            Self::Set(items) => {
                let s: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", s.join(","))
            }
        }
    }
}

impl FromStr for SequenceSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidSequenceSet(s.to_string());

        let mut parts = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            parts.push(match part.split_once(':') {
                None if part == "*" => Self::All,
                None => Self::Single(parse_seq(part).ok_or_else(invalid)?),
                Some((start, "*")) => Self::RangeFrom(parse_seq(start).ok_or_else(invalid)?),
                Some((start, end)) => Self::Range(
                    parse_seq(start).ok_or_else(invalid)?,
                    parse_seq(end).ok_or_else(invalid)?,
                ),
            });
        }

        match parts.len() {
            0 => Err(invalid()),
            1 => Ok(parts.pop().unwrap_or(Self::All)),
            _ => Ok(Self::Set(parts)),
        }
    }
}

fn parse_seq(s: &str) -> Option<SeqNum> {
    s.parse::<u32>().ok().and_then(SeqNum::new)
}

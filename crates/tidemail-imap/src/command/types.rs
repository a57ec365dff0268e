//! Command argument types.

use chrono::NaiveDate;

use crate::types::{Flag, SequenceSet};

/// FETCH items to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItems {
    /// FLAGS INTERNALDATE RFC822.SIZE ENVELOPE macro.
    All,
    /// FLAGS INTERNALDATE RFC822.SIZE macro.
    Fast,
    /// FLAGS INTERNALDATE RFC822.SIZE ENVELOPE BODY macro.
    Full,
    /// Explicit list of data items.
    Items(Vec<FetchAttribute>),
}

impl FetchItems {
    /// Builds FETCH items from user-supplied item strings.
    ///
    /// A single macro name (`all`, `fast`, `full`) selects the macro;
    /// anything else goes through [`FetchAttribute::parse`].
    #[must_use]
    pub fn from_strings(items: &[&str]) -> Self {
        if let [item] = items {
            match item.trim().to_uppercase().as_str() {
                "ALL" => return Self::All,
                "FAST" => return Self::Fast,
                "FULL" => return Self::Full,
                _ => {}
            }
        }
        Self::Items(items.iter().map(|s| FetchAttribute::parse(s)).collect())
    }
}

impl Default for FetchItems {
    fn default() -> Self {
        Self::Fast
    }
}

/// Individual FETCH data item.
///
/// Mirrors the shapes a FETCH data item can take on the wire: a bare atom
/// (`UID`, `RFC822.SIZE`), a bracketed section with an optional partial
/// (`BODY.PEEK[HEADER.FIELDS (DATE SUBJECT)]<0.256>`), a name with a
/// parenthesized argument list (`MODSEQ (1234567)`), or a name with a
/// single atom argument (`CHANGEDSINCE 12345`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// Bare item name.
    Atom(String),
    /// `NAME[section]` with optional `<offset.length>` partial.
    Section {
        /// Item name (`BODY` or `BODY.PEEK`).
        name: String,
        /// Section selector between the brackets, possibly empty.
        section: String,
        /// Partial range `<offset.length>`.
        partial: Option<(u64, u64)>,
    },
    /// `NAME (ARG ...)`.
    Group {
        /// Item name.
        name: String,
        /// Parenthesized arguments.
        args: Vec<String>,
    },
    /// `NAME ARG`.
    Pair {
        /// Item name.
        name: String,
        /// Single atom argument.
        arg: String,
    },
}

impl FetchAttribute {
    /// Parses a user-supplied FETCH item expression.
    ///
    /// Inputs that do not match any recognized shape fall back to a bare
    /// atom of the whole expression; the server is the final authority on
    /// item syntax.
    #[must_use]
    pub fn parse(item: &str) -> Self {
        let trimmed = item.trim();
        Self::try_parse(trimmed).unwrap_or_else(|| Self::Atom(trimmed.to_uppercase()))
    }

    fn try_parse(s: &str) -> Option<Self> {
        if let Some(open) = s.find('[') {
            let name = &s[..open];
            if name.is_empty() || !is_item_name(name) {
                return None;
            }
            let close = s.rfind(']')?;
            if close < open {
                return None;
            }

            let section = normalize_section(&s[open + 1..close]);
            let rest = &s[close + 1..];
            let partial = if rest.is_empty() {
                None
            } else {
                Some(parse_partial(rest)?)
            };

            return Some(Self::Section {
                name: name.to_uppercase(),
                section,
                partial,
            });
        }

        if let Some((name, rest)) = s.split_once(char::is_whitespace) {
            if !is_item_name(name) {
                return None;
            }
            let rest = rest.trim();

            if let Some(inner) = rest.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
                let args: Vec<String> = inner
                    .split_whitespace()
                    .map(str::to_uppercase)
                    .collect();
                if args.is_empty() || !args.iter().all(|a| is_item_name(a)) {
                    return None;
                }
                return Some(Self::Group {
                    name: name.to_uppercase(),
                    args,
                });
            }

            if is_item_name(rest) {
                return Some(Self::Pair {
                    name: name.to_uppercase(),
                    arg: rest.to_uppercase(),
                });
            }

            return None;
        }

        is_item_name(s).then(|| Self::Atom(s.to_uppercase()))
    }
}

/// Item names are atoms of alphanumerics plus `.` (e.g. `RFC822.SIZE`).
fn is_item_name(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'.')
}

/// Uppercases a section selector outside of quoted strings.
fn normalize_section(section: &str) -> String {
    let mut out = String::with_capacity(section.len());
    let mut in_quotes = false;
    for ch in section.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
            out.push(ch);
        } else if in_quotes {
            out.push(ch);
        } else {
            out.extend(ch.to_uppercase());
        }
    }
    out
}

/// Parses a `<offset.length>` suffix.
fn parse_partial(s: &str) -> Option<(u64, u64)> {
    let inner = s.strip_prefix('<')?.strip_suffix('>')?;
    let (offset, length) = inner.split_once('.')?;
    Some((offset.parse().ok()?, length.parse().ok()?))
}

/// STORE flag mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// Replace the flag list (`FLAGS`).
    Set(Vec<Flag>),
    /// Add flags (`+FLAGS`).
    Add(Vec<Flag>),
    /// Remove flags (`-FLAGS`).
    Remove(Vec<Flag>),
}

impl StoreAction {
    /// Builds a replace action from flag strings.
    #[must_use]
    pub fn set(flags: &[&str]) -> Self {
        Self::Set(flags.iter().map(|f| Flag::parse(f)).collect())
    }

    /// Builds an add action from flag strings.
    #[must_use]
    pub fn add(flags: &[&str]) -> Self {
        Self::Add(flags.iter().map(|f| Flag::parse(f)).collect())
    }

    /// Builds a remove action from flag strings.
    #[must_use]
    pub fn remove(flags: &[&str]) -> Self {
        Self::Remove(flags.iter().map(|f| Flag::parse(f)).collect())
    }
}

/// SEARCH criteria.
///
/// Criteria compose recursively through [`SearchCriteria::And`],
/// [`SearchCriteria::Or`] and [`SearchCriteria::Not`]; serialization
/// preserves the given order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// All messages.
    All,
    /// Messages with \Answered.
    Answered,
    /// Messages with \Deleted.
    Deleted,
    /// Messages with \Draft.
    Draft,
    /// Messages with \Flagged.
    Flagged,
    /// Recent messages without \Seen.
    New,
    /// Messages with \Recent.
    Recent,
    /// Messages with \Seen.
    Seen,
    /// Messages without \Answered.
    Unanswered,
    /// Messages without \Deleted.
    Undeleted,
    /// Messages without \Flagged.
    Unflagged,
    /// Messages without \Seen.
    Unseen,
    /// Messages with the given keyword flag.
    Keyword(String),
    /// Messages without the given keyword flag.
    Unkeyword(String),
    /// Message sequence-number set.
    SequenceSet(SequenceSet),
    /// UID set.
    Uid(SequenceSet),
    /// Bcc contains text.
    Bcc(String),
    /// Body contains text.
    Body(String),
    /// Cc contains text.
    Cc(String),
    /// From contains text.
    From(String),
    /// Subject contains text.
    Subject(String),
    /// Header or body contains text.
    Text(String),
    /// To contains text.
    To(String),
    /// Named header contains value.
    Header(String, String),
    /// Larger than size in octets.
    Larger(u32),
    /// Smaller than size in octets.
    Smaller(u32),
    /// Internal date before the day.
    Before(NaiveDate),
    /// Internal date within the day.
    On(NaiveDate),
    /// Internal date on or after the day.
    Since(NaiveDate),
    /// Date header before the day.
    SentBefore(NaiveDate),
    /// Date header within the day.
    SentOn(NaiveDate),
    /// Date header on or after the day.
    SentSince(NaiveDate),
    /// Mod-sequence greater than or equal to the value (CONDSTORE).
    ModSeq(u64),
    /// Conjunction, in order.
    And(Vec<Self>),
    /// Disjunction of two criteria.
    Or(Box<Self>, Box<Self>),
    /// Negation.
    Not(Box<Self>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_macro_detection() {
        assert_eq!(FetchItems::from_strings(&["all"]), FetchItems::All);
        assert_eq!(FetchItems::from_strings(&["FAST"]), FetchItems::Fast);
        assert_eq!(FetchItems::from_strings(&["full"]), FetchItems::Full);
    }

    #[test]
    fn test_items_list() {
        let items = FetchItems::from_strings(&["uid", "flags"]);
        assert_eq!(
            items,
            FetchItems::Items(vec![
                FetchAttribute::Atom("UID".to_string()),
                FetchAttribute::Atom("FLAGS".to_string()),
            ])
        );
    }

    #[test]
    fn test_parse_bare_atom() {
        assert_eq!(
            FetchAttribute::parse("rfc822.size"),
            FetchAttribute::Atom("RFC822.SIZE".to_string())
        );
    }

    #[test]
    fn test_parse_body_section() {
        assert_eq!(
            FetchAttribute::parse("body[header.fields (date in-reply-to)]"),
            FetchAttribute::Section {
                name: "BODY".to_string(),
                section: "HEADER.FIELDS (DATE IN-REPLY-TO)".to_string(),
                partial: None,
            }
        );
    }

    #[test]
    fn test_parse_body_peek_with_partial() {
        assert_eq!(
            FetchAttribute::parse("body.peek[1.2]<0.256>"),
            FetchAttribute::Section {
                name: "BODY.PEEK".to_string(),
                section: "1.2".to_string(),
                partial: Some((0, 256)),
            }
        );
    }

    #[test]
    fn test_parse_empty_section() {
        assert_eq!(
            FetchAttribute::parse("body[]"),
            FetchAttribute::Section {
                name: "BODY".to_string(),
                section: String::new(),
                partial: None,
            }
        );
    }

    #[test]
    fn test_parse_group() {
        assert_eq!(
            FetchAttribute::parse("modseq (1234567)"),
            FetchAttribute::Group {
                name: "MODSEQ".to_string(),
                args: vec!["1234567".to_string()],
            }
        );
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            FetchAttribute::parse("changedsince 12345"),
            FetchAttribute::Pair {
                name: "CHANGEDSINCE".to_string(),
                arg: "12345".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_section_quotes_preserved() {
        assert_eq!(
            FetchAttribute::parse("body[header.fields (\"List-Id\")]"),
            FetchAttribute::Section {
                name: "BODY".to_string(),
                section: "HEADER.FIELDS (\"List-Id\")".to_string(),
                partial: None,
            }
        );
    }

    #[test]
    fn test_parse_falls_back_to_atom() {
        // Unbalanced brackets are not an error; the whole expression is
        // emitted verbatim and the server decides.
        assert_eq!(
            FetchAttribute::parse("body[header"),
            FetchAttribute::Atom("BODY[HEADER".to_string())
        );
        assert_eq!(
            FetchAttribute::parse("body[]<0>"),
            FetchAttribute::Atom("BODY[]<0>".to_string())
        );
    }

    #[test]
    fn test_store_action_builders() {
        assert_eq!(
            StoreAction::remove(&["a", "b"]),
            StoreAction::Remove(vec![
                Flag::Keyword("a".to_string()),
                Flag::Keyword("b".to_string()),
            ])
        );
        assert_eq!(
            StoreAction::set(&["\\Seen"]),
            StoreAction::Set(vec![Flag::Seen])
        );
    }
}

//! Command serialization helpers.

use chrono::{Datelike, NaiveDate};

use crate::types::Mailbox;

use super::types::{FetchAttribute, FetchItems, SearchCriteria, StoreAction};

/// Writes an astring (atom where possible, quoted string otherwise).
pub fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        write_string(buf, s);
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Writes an IMAP quoted string.
pub fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for b in s.bytes() {
        if b == b'"' || b == b'\\' {
            buf.push(b'\\');
        }
        buf.push(b);
    }
    buf.push(b'"');
}

/// Writes a mailbox name.
pub fn write_mailbox(buf: &mut Vec<u8>, mailbox: &Mailbox) {
    write_astring(buf, mailbox.as_str());
}

/// Returns true if the byte forces quoting.
const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b == 0x7F
}

/// Formats a date the way SEARCH wants it: `3-Feb-2011`.
#[must_use]
pub fn format_imap_date(date: NaiveDate) -> String {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    format!(
        "{}-{}-{}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

/// Writes FETCH items.
pub fn write_fetch_items(buf: &mut Vec<u8>, items: &FetchItems) {
    match items {
        FetchItems::All => buf.extend_from_slice(b"ALL"),
        FetchItems::Fast => buf.extend_from_slice(b"FAST"),
        FetchItems::Full => buf.extend_from_slice(b"FULL"),
        FetchItems::Items(attrs) => {
            if let [attr] = attrs.as_slice() {
                write_fetch_attribute(buf, attr);
            } else {
                buf.push(b'(');
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        buf.push(b' ');
                    }
                    write_fetch_attribute(buf, attr);
                }
                buf.push(b')');
            }
        }
    }
}

/// Writes a single FETCH data item.
pub fn write_fetch_attribute(buf: &mut Vec<u8>, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Atom(name) => buf.extend_from_slice(name.as_bytes()),
        FetchAttribute::Section {
            name,
            section,
            partial,
        } => {
            buf.extend_from_slice(name.as_bytes());
            buf.push(b'[');
            buf.extend_from_slice(section.as_bytes());
            buf.push(b']');
            if let Some((offset, length)) = partial {
                buf.extend_from_slice(format!("<{offset}.{length}>").as_bytes());
            }
        }
        FetchAttribute::Group { name, args } => {
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b" (");
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    buf.push(b' ');
                }
                buf.extend_from_slice(arg.as_bytes());
            }
            buf.push(b')');
        }
        FetchAttribute::Pair { name, arg } => {
            buf.extend_from_slice(name.as_bytes());
            buf.push(b' ');
            buf.extend_from_slice(arg.as_bytes());
        }
    }
}

/// Writes the STORE action atom and flag list.
pub fn write_store_action(buf: &mut Vec<u8>, action: &StoreAction, silent: bool) {
    let (prefix, flags) = match action {
        StoreAction::Set(f) => ("FLAGS", f),
        StoreAction::Add(f) => ("+FLAGS", f),
        StoreAction::Remove(f) => ("-FLAGS", f),
    };
    buf.extend_from_slice(prefix.as_bytes());
    if silent {
        buf.extend_from_slice(b".SILENT");
    }
    buf.extend_from_slice(b" (");
    for (i, flag) in flags.iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        buf.extend_from_slice(flag.as_str().as_bytes());
    }
    buf.push(b')');
}

/// Writes SEARCH criteria.
#[allow(clippy::too_many_lines)]
pub fn write_search_criteria(buf: &mut Vec<u8>, criteria: &SearchCriteria) {
    match criteria {
        SearchCriteria::All => buf.extend_from_slice(b"ALL"),
        SearchCriteria::Answered => buf.extend_from_slice(b"ANSWERED"),
        SearchCriteria::Deleted => buf.extend_from_slice(b"DELETED"),
        SearchCriteria::Draft => buf.extend_from_slice(b"DRAFT"),
        SearchCriteria::Flagged => buf.extend_from_slice(b"FLAGGED"),
        SearchCriteria::New => buf.extend_from_slice(b"NEW"),
        SearchCriteria::Recent => buf.extend_from_slice(b"RECENT"),
        SearchCriteria::Seen => buf.extend_from_slice(b"SEEN"),
        SearchCriteria::Unanswered => buf.extend_from_slice(b"UNANSWERED"),
        SearchCriteria::Undeleted => buf.extend_from_slice(b"UNDELETED"),
        SearchCriteria::Unflagged => buf.extend_from_slice(b"UNFLAGGED"),
        SearchCriteria::Unseen => buf.extend_from_slice(b"UNSEEN"),
        SearchCriteria::Keyword(k) => {
            buf.extend_from_slice(b"KEYWORD ");
            buf.extend_from_slice(k.as_bytes());
        }
        SearchCriteria::Unkeyword(k) => {
            buf.extend_from_slice(b"UNKEYWORD ");
            buf.extend_from_slice(k.as_bytes());
        }
        SearchCriteria::SequenceSet(set) => {
            buf.extend_from_slice(set.to_string().as_bytes());
        }
        SearchCriteria::Uid(set) => {
            buf.extend_from_slice(b"UID ");
            buf.extend_from_slice(set.to_string().as_bytes());
        }
        SearchCriteria::Bcc(s) => write_text_criterion(buf, "BCC", s),
        SearchCriteria::Body(s) => write_text_criterion(buf, "BODY", s),
        SearchCriteria::Cc(s) => write_text_criterion(buf, "CC", s),
        SearchCriteria::From(s) => write_text_criterion(buf, "FROM", s),
        SearchCriteria::Subject(s) => write_text_criterion(buf, "SUBJECT", s),
        SearchCriteria::Text(s) => write_text_criterion(buf, "TEXT", s),
        SearchCriteria::To(s) => write_text_criterion(buf, "TO", s),
        SearchCriteria::Header(name, value) => {
            buf.extend_from_slice(b"HEADER ");
            write_string(buf, name);
            buf.push(b' ');
            write_string(buf, value);
        }
        SearchCriteria::Larger(size) => {
            buf.extend_from_slice(format!("LARGER {size}").as_bytes());
        }
        SearchCriteria::Smaller(size) => {
            buf.extend_from_slice(format!("SMALLER {size}").as_bytes());
        }
        SearchCriteria::Before(d) => write_date_criterion(buf, "BEFORE", *d),
        SearchCriteria::On(d) => write_date_criterion(buf, "ON", *d),
        SearchCriteria::Since(d) => write_date_criterion(buf, "SINCE", *d),
        SearchCriteria::SentBefore(d) => write_date_criterion(buf, "SENTBEFORE", *d),
        SearchCriteria::SentOn(d) => write_date_criterion(buf, "SENTON", *d),
        SearchCriteria::SentSince(d) => write_date_criterion(buf, "SENTSINCE", *d),
        SearchCriteria::ModSeq(modseq) => {
            buf.extend_from_slice(format!("MODSEQ {modseq}").as_bytes());
        }
        SearchCriteria::And(criteria) => {
            for (i, c) in criteria.iter().enumerate() {
                if i > 0 {
                    buf.push(b' ');
                }
                write_search_criteria(buf, c);
            }
        }
        SearchCriteria::Or(a, b) => {
            buf.extend_from_slice(b"OR ");
            write_search_criteria(buf, a);
            buf.push(b' ');
            write_search_criteria(buf, b);
        }
        SearchCriteria::Not(c) => {
            buf.extend_from_slice(b"NOT ");
            write_search_criteria(buf, c);
        }
    }
}

fn write_text_criterion(buf: &mut Vec<u8>, key: &str, value: &str) {
    buf.extend_from_slice(key.as_bytes());
    buf.push(b' ');
    write_string(buf, value);
}

fn write_date_criterion(buf: &mut Vec<u8>, key: &str, date: NaiveDate) {
    buf.extend_from_slice(key.as_bytes());
    buf.push(b' ');
    write_string(buf, &format_imap_date(date));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Vec<u8>)) -> String {
        let mut buf = Vec::new();
        f(&mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_astring_atom() {
        assert_eq!(render(|b| write_astring(b, "user@example.com")), "user@example.com");
    }

    #[test]
    fn test_astring_quoted() {
        assert_eq!(render(|b| write_astring(b, "pass word")), "\"pass word\"");
        assert_eq!(render(|b| write_astring(b, "")), "\"\"");
        assert_eq!(render(|b| write_astring(b, "a\"b")), "\"a\\\"b\"");
    }

    #[test]
    fn test_format_imap_date() {
        let d = NaiveDate::from_ymd_opt(2011, 2, 3).unwrap();
        assert_eq!(format_imap_date(d), "3-Feb-2011");
        let d = NaiveDate::from_ymd_opt(2011, 12, 23).unwrap();
        assert_eq!(format_imap_date(d), "23-Dec-2011");
    }
}

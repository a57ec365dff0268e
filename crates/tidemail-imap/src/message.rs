//! Decoded message records from FETCH responses.

use std::collections::BTreeMap;

use crate::parser::{BodyStructure, Envelope, FetchField, UntaggedResponse};
use crate::types::Flags;

/// One message as returned by FETCH-shaped commands.
///
/// Well-known items land in typed fields; everything else (body sections,
/// server-specific items) is keyed by its canonical lowercase item key in
/// [`Message::sections`], with `<offset.length>` suffixes preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    /// Message sequence number.
    pub seq: u32,
    /// UID, if fetched.
    pub uid: Option<u32>,
    /// Mod-sequence (CONDSTORE), if fetched.
    pub modseq: Option<u64>,
    /// RFC822.SIZE, if fetched.
    pub size: Option<u32>,
    /// INTERNALDATE, if fetched.
    pub internal_date: Option<String>,
    /// Flags, if fetched.
    pub flags: Option<Flags>,
    /// Envelope, if fetched.
    pub envelope: Option<Envelope>,
    /// Body structure, if fetched.
    pub body_structure: Option<BodyStructure>,
    /// Remaining items by canonical key (e.g. `body[header.fields (date
    /// subject)]<0.123>`); NIL values are omitted.
    pub sections: BTreeMap<String, String>,
}

impl Message {
    /// Builds a message from the parsed fields of one FETCH record.
    #[must_use]
    pub fn from_fields(seq: u32, fields: Vec<FetchField>) -> Self {
        let mut message = Self {
            seq,
            ..Self::default()
        };

        for field in fields {
            match field {
                FetchField::Uid(uid) => message.uid = Some(uid.get()),
                FetchField::Size(size) => message.size = Some(size),
                FetchField::ModSeq(modseq) => message.modseq = Some(modseq),
                FetchField::Flags(flags) => message.flags = Some(flags),
                FetchField::InternalDate(date) => message.internal_date = Some(date),
                FetchField::Envelope(env) => message.envelope = Some(*env),
                FetchField::BodyStructure(bs) => message.body_structure = Some(*bs),
                FetchField::Data { key, value } => {
                    if let Some(value) = value {
                        message.sections.insert(key, value);
                    }
                }
            }
        }

        message
    }
}

/// Converts the FETCH records collected for a command into messages, in
/// arrival order. Non-FETCH records are ignored; an empty payload yields
/// an empty list.
#[must_use]
pub fn parse_fetch_records(records: &[UntaggedResponse]) -> Vec<Message> {
    records
        .iter()
        .filter_map(|record| match record {
            UntaggedResponse::Fetch { seq, fields } => {
                Some(Message::from_fields(seq.get(), fields.clone()))
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::{Response, ResponseParser};
    use crate::types::Flag;

    fn record(line: &[u8]) -> UntaggedResponse {
        match ResponseParser::parse(line).unwrap() {
            Response::Untagged(untagged) => untagged,
            other => panic!("Expected untagged, got {other:?}"),
        }
    }

    #[test]
    fn test_flags_and_modseq_message() {
        let records = vec![record(b"* 123 FETCH (FLAGS (\\Seen) MODSEQ (4))\r\n")];
        let messages = parse_fetch_records(&records);

        assert_eq!(messages.len(), 1);
        let msg = &messages[0];
        assert_eq!(msg.seq, 123);
        assert_eq!(msg.modseq, Some(4));
        assert!(msg.flags.as_ref().unwrap().contains(&Flag::Seen));
    }

    #[test]
    fn test_typed_fields() {
        let records = vec![record(
            b"* 1 FETCH (UID 100 RFC822.SIZE 2048 INTERNALDATE \"17-Jul-1996 02:44:25 -0700\")\r\n",
        )];
        let messages = parse_fetch_records(&records);

        let msg = &messages[0];
        assert_eq!(msg.uid, Some(100));
        assert_eq!(msg.size, Some(2048));
        assert_eq!(
            msg.internal_date.as_deref(),
            Some("17-Jul-1996 02:44:25 -0700")
        );
    }

    #[test]
    fn test_section_keys_preserved() {
        let records = vec![record(
            b"* 2 FETCH (BODY[HEADER (DATE SUBJECT)]<0.123> {4}\r\ndata)\r\n",
        )];
        let messages = parse_fetch_records(&records);

        assert_eq!(
            messages[0]
                .sections
                .get("body[header (date subject)]<0.123>")
                .map(String::as_str),
            Some("data")
        );
    }

    #[test]
    fn test_empty_payload() {
        assert!(parse_fetch_records(&[]).is_empty());
        let records = vec![record(b"* 5 EXISTS\r\n")];
        assert!(parse_fetch_records(&records).is_empty());
    }

    #[test]
    fn test_multiple_records_in_order() {
        let records = vec![
            record(b"* 3 FETCH (UID 30)\r\n"),
            record(b"* 1 FETCH (UID 10)\r\n"),
        ];
        let messages = parse_fetch_records(&records);
        assert_eq!(messages[0].seq, 3);
        assert_eq!(messages[1].seq, 1);
    }
}

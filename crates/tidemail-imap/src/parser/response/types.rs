//! Response data types.

use crate::types::{Capability, Flags, ListItem, Namespace, ResponseCode, SeqNum, Uid};

/// One parsed FETCH data pair.
///
/// Item keys are canonicalized to lowercase; for `BODY[...]` sections the
/// partial suffix is stripped for dispatch but preserved in the stored
/// key, so `body[header]<0.123>` stays addressable as sent.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchField {
    /// UID item.
    Uid(Uid),
    /// RFC822.SIZE item.
    Size(u32),
    /// MODSEQ item (CONDSTORE).
    ModSeq(u64),
    /// FLAGS item.
    Flags(Flags),
    /// INTERNALDATE item.
    InternalDate(String),
    /// ENVELOPE item.
    Envelope(Box<Envelope>),
    /// BODYSTRUCTURE (or bare BODY structure form) item.
    BodyStructure(Box<BodyStructure>),
    /// Any other item, keyed by its canonical lowercase form.
    Data {
        /// Canonical key, e.g. `body[header.fields (date subject)]<0.123>`.
        key: String,
        /// Item value; `None` for NIL.
        value: Option<String>,
    },
}

/// Message envelope.
///
/// Subject and address display names are RFC 2047 decoded at parse time;
/// the remaining fields pass through as sent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Date header.
    pub date: Option<String>,
    /// Subject header, encoded-word decoded.
    pub subject: Option<String>,
    /// From addresses.
    pub from: Vec<Address>,
    /// Sender addresses.
    pub sender: Vec<Address>,
    /// Reply-To addresses.
    pub reply_to: Vec<Address>,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// Bcc addresses.
    pub bcc: Vec<Address>,
    /// In-Reply-To header.
    pub in_reply_to: Option<String>,
    /// Message-ID header.
    pub message_id: Option<String>,
}

/// One envelope address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Display name, encoded-word decoded.
    pub name: Option<String>,
    /// `mailbox@host`, when both parts were present.
    pub address: Option<String>,
}

/// Parsed BODYSTRUCTURE node.
///
/// One struct covers both multipart and leaf nodes; fields that a given
/// node kind does not carry stay unset. Decoding is tolerant: missing
/// trailing extension fields are simply absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BodyStructure {
    /// Dotted part path (`1`, `2.1`, ...); absent on the root node.
    pub part: Option<String>,
    /// Full MIME type, lowercase (`text/plain`, `multipart/mixed`).
    pub media_type: String,
    /// Body parameters, keys lowercased.
    pub parameters: Vec<(String, String)>,
    /// Content-ID (leaf only).
    pub id: Option<String>,
    /// Content-Description (leaf only).
    pub description: Option<String>,
    /// Content-Transfer-Encoding, lowercase (leaf only).
    pub encoding: Option<String>,
    /// Body size in octets (leaf only).
    pub size: Option<u64>,
    /// Line count (`text/*` and `message/rfc822` leaves).
    pub line_count: Option<u64>,
    /// Body MD5 (leaf extension data).
    pub md5: Option<String>,
    /// Envelope of the nested message (`message/rfc822` only).
    pub envelope: Option<Box<Envelope>>,
    /// Content-Disposition type, lowercase.
    pub disposition: Option<String>,
    /// Content-Disposition parameters, keys lowercased.
    pub disposition_parameters: Vec<(String, String)>,
    /// Content-Language values, lowercase.
    pub language: Vec<String>,
    /// Content-Location.
    pub location: Option<String>,
    /// Child nodes: multipart children, or the single nested node of a
    /// `message/rfc822` part.
    pub child_nodes: Vec<BodyStructure>,
}

impl BodyStructure {
    /// Returns true if this node is a multipart container.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.media_type.starts_with("multipart/")
    }
}

/// Untagged response data.
#[derive(Debug, Clone, PartialEq)]
pub enum UntaggedResponse {
    /// OK response with optional code.
    Ok {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// NO response.
    No {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// BAD response.
    Bad {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// PREAUTH greeting.
    PreAuth {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// BYE response.
    Bye {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// CAPABILITY response.
    Capability(Vec<Capability>),
    /// LIST response.
    List(ListItem),
    /// LSUB response.
    Lsub(ListItem),
    /// FLAGS response.
    Flags(Flags),
    /// EXISTS response (message count).
    Exists(u32),
    /// RECENT response.
    Recent(u32),
    /// EXPUNGE response (message removed).
    Expunge(SeqNum),
    /// FETCH response.
    Fetch {
        /// Message sequence number.
        seq: SeqNum,
        /// Parsed data pairs.
        fields: Vec<FetchField>,
    },
    /// SEARCH response.
    Search(Vec<u32>),
    /// NAMESPACE response.
    Namespace(Namespace),
    /// ID response; `None` when the server sent `ID NIL`.
    Id(Option<Vec<(String, String)>>),
}

impl UntaggedResponse {
    /// Returns the response kind as a lowercase atom, the key used for
    /// per-command payload collection.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ok { .. } => "ok",
            Self::No { .. } => "no",
            Self::Bad { .. } => "bad",
            Self::PreAuth { .. } => "preauth",
            Self::Bye { .. } => "bye",
            Self::Capability(_) => "capability",
            Self::List(_) => "list",
            Self::Lsub(_) => "lsub",
            Self::Flags(_) => "flags",
            Self::Exists(_) => "exists",
            Self::Recent(_) => "recent",
            Self::Expunge(_) => "expunge",
            Self::Fetch { .. } => "fetch",
            Self::Search(_) => "search",
            Self::Namespace(_) => "namespace",
            Self::Id(_) => "id",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_atoms() {
        assert_eq!(UntaggedResponse::Exists(1).kind(), "exists");
        assert_eq!(UntaggedResponse::Search(vec![]).kind(), "search");
        assert_eq!(
            UntaggedResponse::Ok {
                code: None,
                text: String::new()
            }
            .kind(),
            "ok"
        );
    }

    #[test]
    fn test_body_structure_multipart_flag() {
        let node = BodyStructure {
            media_type: "multipart/mixed".to_string(),
            ..BodyStructure::default()
        };
        assert!(node.is_multipart());

        let leaf = BodyStructure {
            media_type: "text/plain".to_string(),
            ..BodyStructure::default()
        };
        assert!(!leaf.is_multipart());
    }
}

//! Mailbox tree building and special-use detection.
//!
//! LIST/LSUB lines are merged into a tree rooted at an anonymous node.
//! Node names are decoded from modified UTF-7 for display while `path`
//! keeps the wire (encoded) form used in commands.

use tidemail_mime::decode_utf7_imap;

use crate::types::MailboxAttribute;

/// One node of the mailbox tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MailboxNode {
    /// True only on the anonymous root node.
    pub root: bool,
    /// Display name of this level, modified-UTF-7 decoded.
    pub name: String,
    /// Full wire path, joined with the delimiter.
    pub path: String,
    /// Hierarchy delimiter.
    pub delimiter: Option<char>,
    /// Child nodes.
    pub children: Vec<MailboxNode>,
    /// Mailbox attributes from LIST.
    pub flags: Vec<MailboxAttribute>,
    /// Present in the LIST output (not just an intermediate node).
    pub listed: bool,
    /// Present in the LSUB output.
    pub subscribed: bool,
    /// Inferred special-use flag (`\Sent`, `\Trash`, ...).
    pub special_use: Option<String>,
}

impl MailboxNode {
    /// Creates the anonymous root node.
    #[must_use]
    pub fn root() -> Self {
        Self {
            root: true,
            ..Self::default()
        }
    }
}

/// Walks (and creates as needed) the tree branch for `path`, returning
/// the leaf node. Node identity is by wire path; INBOX matches
/// case-insensitively per RFC 3501.
pub fn ensure_path<'a>(
    tree: &'a mut MailboxNode,
    path: &str,
    delimiter: &str,
) -> &'a mut MailboxNode {
    let names: Vec<&str> = if delimiter.is_empty() {
        vec![path]
    } else {
        path.split(delimiter).collect()
    };

    let mut current = tree;

    for i in 0..names.len() {
        let branch_path = names[..=i].join(delimiter);

        let found = current
            .children
            .iter()
            .position(|child| paths_equal(&child.path, &branch_path));

        let index = match found {
            Some(index) => index,
            None => {
                current.children.push(MailboxNode {
                    name: decode_utf7_imap(names[i]),
                    path: branch_path,
                    delimiter: delimiter.chars().next(),
                    ..MailboxNode::default()
                });
                current.children.len() - 1
            }
        };

        current = &mut current.children[index];
    }

    current
}

fn paths_equal(a: &str, b: &str) -> bool {
    if a.eq_ignore_ascii_case("INBOX") {
        b.eq_ignore_ascii_case("INBOX")
    } else {
        a == b
    }
}

/// Special-use flags tested against LIST attributes (RFC 6154).
const SPECIAL_USE_FLAGS: [(MailboxAttribute, &str); 7] = [
    (MailboxAttribute::All, "\\All"),
    (MailboxAttribute::Archive, "\\Archive"),
    (MailboxAttribute::Drafts, "\\Drafts"),
    (MailboxAttribute::Flagged, "\\Flagged"),
    (MailboxAttribute::Junk, "\\Junk"),
    (MailboxAttribute::Sent, "\\Sent"),
    (MailboxAttribute::Trash, "\\Trash"),
];

/// Infers the node's special use.
///
/// When the server advertises SPECIAL-USE the LIST attributes are
/// authoritative and the first matching flag wins. Otherwise the node
/// name is looked up in the multilingual mailbox-name dictionary and a
/// matching flag is appended to the node.
pub fn check_special_use(node: &mut MailboxNode, special_use_advertised: bool) {
    if special_use_advertised {
        for (attribute, flag) in &SPECIAL_USE_FLAGS {
            if node.flags.contains(attribute) {
                node.special_use = Some((*flag).to_string());
                return;
            }
        }
        return;
    }

    let name = node.name.trim().to_lowercase();
    if let Some((attribute, flag)) = special_use_by_name(&name) {
        node.flags.push(attribute);
        node.special_use = Some(flag.to_string());
    }
}

/// Looks up a localized mailbox name in the embedded dictionary.
fn special_use_by_name(name: &str) -> Option<(MailboxAttribute, &'static str)> {
    if SENT_NAMES.contains(&name) {
        Some((MailboxAttribute::Sent, "\\Sent"))
    } else if TRASH_NAMES.contains(&name) {
        Some((MailboxAttribute::Trash, "\\Trash"))
    } else if JUNK_NAMES.contains(&name) {
        Some((MailboxAttribute::Junk, "\\Junk"))
    } else if DRAFTS_NAMES.contains(&name) {
        Some((MailboxAttribute::Drafts, "\\Drafts"))
    } else {
        None
    }
}

// Localized names servers use for the standard mailboxes, lowercase.
// Collected from deployed webmail and desktop clients; matched against
// the trimmed, lowercased display name.

const SENT_NAMES: &[&str] = &[
    "aika",
    "bidaliak",
    "bidalita",
    "dihantar",
    "e rometsweng",
    "e tindami",
    "elküldött",
    "elküldöttek",
    "enviadas",
    "enviados",
    "enviats",
    "envoyés",
    "ethunyelweyo",
    "expediate",
    "ezipuru",
    "gesendete",
    "gestuur",
    "gönderilmiş öğeler",
    "göndərilənlər",
    "iberilen",
    "inviati",
    "išsiųstieji",
    "kuthunyelwe",
    "lasa",
    "lähetetyt",
    "messages envoyés",
    "naipadala",
    "nalefa",
    "napadala",
    "nosūtītās ziņas",
    "odeslané",
    "odoslané",
    "padala",
    "poslane",
    "poslano",
    "poslané",
    "poslato",
    "saadetud",
    "saadetud kirjad",
    "sendt",
    "sent",
    "sent items",
    "sent messages",
    "sända poster",
    "sänt",
    "terkirim",
    "ti fi ranṣẹ",
    "të dërguara",
    "verzonden",
    "vilivyotumwa",
    "wysłane",
    "đã gửi",
    "σταλθέντα",
    "жиберилген",
    "жіберілгендер",
    "изпратени",
    "илгээсэн",
    "ирсол шуд",
    "испратено",
    "надіслані",
    "отправленные",
    "пасланыя",
    "юборилган",
    "ուղարկված",
    "נשלחו",
    "פריטים שנשלחו",
    "المرسلة",
    "بھیجے گئے",
    "سوزمژہ",
    "لېګل شوی",
    "موارد ارسال شده",
    "पाठविले",
    "प्रेषित",
    "भेजा गया",
    "প্রেরিত",
    "প্ৰেৰিত",
    "ਭੇਜੇ",
    "મોકલેલા",
    "ପଠାଗଲା",
    "அனுப்பியவை",
    "పంపించబడింది",
    "ಕಳುಹಿಸಲಾದ",
    "അയച്ചു",
    "යැවු පණිවුඩ",
    "ส่งแล้ว",
    "გაგზავნილი",
    "የተላኩ",
    "បានផ្ញើ",
    "寄件備份",
    "已发信息",
    "送信済みメール",
    "발신 메시지",
    "보낸 편지함",
];

const TRASH_NAMES: &[&str] = &[
    "articole șterse",
    "bin",
    "borttagna objekt",
    "deleted",
    "deleted items",
    "deleted messages",
    "elementi eliminati",
    "elementos borrados",
    "elementos eliminados",
    "gelöschte objekte",
    "item dipadam",
    "itens apagados",
    "itens excluídos",
    "mục đã xóa",
    "odstraněné položky",
    "pesan terhapus",
    "poistetut",
    "praher",
    "prügikast",
    "silinmiş öğeler",
    "slettede beskeder",
    "slettede elementer",
    "trash",
    "törölt elemek",
    "usunięte wiadomości",
    "verwijderde items",
    "vymazané správy",
    "éléments supprimés",
    "удаленные",
    "פריטים שנמחקו",
    "العناصر المحذوفة",
    "موارد حذف شده",
    "รายการที่ลบ",
    "已删除邮件",
    "已刪除項目",
];

const JUNK_NAMES: &[&str] = &[
    "bulk mail",
    "correo no deseado",
    "courrier indésirable",
    "istenmeyen",
    "istenmeyen e-posta",
    "junk",
    "levélszemét",
    "nevyžiadaná pošta",
    "nevyžádaná pošta",
    "no deseado",
    "posta indesiderata",
    "pourriel",
    "roskaposti",
    "skräppost",
    "spam",
    "spamowanie",
    "søppelpost",
    "thư rác",
    "спам",
    "דואר זבל",
    "الرسائل العشوائية",
    "هرزنامه",
    "สแปม",
    "垃圾邮件",
    "垃圾郵件",
    "垃圾電郵",
];

const DRAFTS_NAMES: &[&str] = &[
    "ba brouillon",
    "borrador",
    "borradores",
    "bozze",
    "brouillons",
    "bản thảo",
    "ciorne",
    "concepten",
    "draf",
    "draftet",
    "drafts",
    "entwürfe",
    "esborranys",
    "garalamalar",
    "ihe edeturu",
    "iidrafti",
    "izinhlaka",
    "juodraščiai",
    "kladd",
    "kladder",
    "koncepty",
    "konsep",
    "konsepte",
    "kopie robocze",
    "layihələr",
    "luonnokset",
    "melnraksti",
    "meralo",
    "mesazhe të padërguara",
    "mga draft",
    "mustandid",
    "nacrti",
    "osnutki",
    "piszkozatok",
    "rascunhos",
    "rasimu",
    "skice",
    "taslaklar",
    "tsararrun saƙonni",
    "utkast",
    "vakiraoka",
    "vázlatok",
    "zirriborroak",
    "àwọn àkọpamọ́",
    "πρόχειρα",
    "жобалар",
    "нацрти",
    "нооргууд",
    "сиёҳнавис",
    "хомаки хатлар",
    "чарнавікі",
    "чернетки",
    "чернови",
    "черновики",
    "черновиктер",
    "սևագրեր",
    "טיוטות",
    "مسودات",
    "موسودې",
    "پیش نویسها",
    "ड्राफ़्ट",
    "प्रारूप",
    "খসড়া",
    "ড্ৰাফ্ট",
    "ਡ੍ਰਾਫਟ",
    "ડ્રાફ્ટસ",
    "ଡ୍ରାଫ୍ଟ",
    "வரைவுகள்",
    "చిత్తు ప్రతులు",
    "ಕರಡುಗಳು",
    "കരടുകള്‍",
    "කෙටුම් පත්",
    "ฉบับร่าง",
    "მონახაზები",
    "ረቂቆች",
    "សារព្រាង",
    "下書き",
    "草稿",
    "임시 보관함",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_path_creates_branch() {
        let mut tree = MailboxNode::root();
        let leaf = ensure_path(&mut tree, "hello/world", "/");

        assert_eq!(leaf.name, "world");
        assert_eq!(leaf.path, "hello/world");
        assert_eq!(leaf.delimiter, Some('/'));
        assert!(leaf.children.is_empty());

        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].name, "hello");
        assert_eq!(tree.children[0].path, "hello");
        assert_eq!(tree.children[0].children.len(), 1);
    }

    #[test]
    fn test_ensure_path_is_idempotent() {
        let mut tree = MailboxNode::root();
        ensure_path(&mut tree, "hello/world", "/").listed = true;
        let again = ensure_path(&mut tree, "hello/world", "/");

        // Identity by path: the existing node is returned
        assert!(again.listed);
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].children.len(), 1);
    }

    #[test]
    fn test_ensure_path_inbox_case_insensitive() {
        let mut tree = MailboxNode::root();
        ensure_path(&mut tree, "INBOX", "/").listed = true;
        let again = ensure_path(&mut tree, "Inbox", "/");
        assert!(again.listed);
        assert_eq!(tree.children.len(), 1);
    }

    #[test]
    fn test_ensure_path_decodes_names() {
        let mut tree = MailboxNode::root();
        let leaf = ensure_path(&mut tree, "INBOX/Entw&APw-rfe", "/");
        assert_eq!(leaf.name, "Entwürfe");
        // The wire path keeps the encoded form
        assert_eq!(leaf.path, "INBOX/Entw&APw-rfe");
    }

    #[test]
    fn test_special_use_from_flags() {
        let mut node = MailboxNode {
            flags: vec![MailboxAttribute::HasNoChildren, MailboxAttribute::Sent],
            ..MailboxNode::default()
        };
        check_special_use(&mut node, true);
        assert_eq!(node.special_use.as_deref(), Some("\\Sent"));
    }

    #[test]
    fn test_special_use_flags_ignored_by_name_when_advertised() {
        let mut node = MailboxNode {
            name: "random".to_string(),
            ..MailboxNode::default()
        };
        check_special_use(&mut node, true);
        assert!(node.special_use.is_none());
    }

    #[test]
    fn test_special_use_by_localized_name() {
        for (name, flag) in [
            ("Sent Items", "\\Sent"),
            ("bidalita", "\\Sent"),
            ("prügikast", "\\Trash"),
            ("Roskaposti", "\\Junk"),
            ("Entwürfe", "\\Drafts"),
        ] {
            let mut node = MailboxNode {
                name: name.to_string(),
                ..MailboxNode::default()
            };
            check_special_use(&mut node, false);
            assert_eq!(node.special_use.as_deref(), Some(flag), "name {name}");
            assert_eq!(node.flags.len(), 1);
        }
    }

    #[test]
    fn test_no_special_use_match() {
        let mut node = MailboxNode {
            name: "Receipts".to_string(),
            ..MailboxNode::default()
        };
        check_special_use(&mut node, false);
        assert!(node.special_use.is_none());
        assert!(node.flags.is_empty());
    }
}

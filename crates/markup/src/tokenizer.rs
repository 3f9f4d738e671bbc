//! Fragment tokenizer with a constrained, practical name character set.
//!
//! Tag and attribute names are ASCII `[A-Za-z0-9:_-]` and are interned
//! lowercase. This is not an HTML5 state machine: there is no parse-error
//! recovery beyond skipping bytes that cannot start a construct. Known
//! limitations:
//! - `script`/`style` bodies are raw text; the close tag scan accepts only ASCII
//!   whitespace before `>`.
//! - Unterminated comments swallow the rest of the input.
use crate::entities::decode_entities;
use crate::types::{AtomId, AtomTable, Token, TokenStream};
use memchr::memchr;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";
const SCRIPT_CLOSE_TAG: &[u8] = b"</script";
const STYLE_CLOSE_TAG: &[u8] = b"</style";

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack
        .get(start..start + needle.len())
        .is_some_and(|window| window.eq_ignore_ascii_case(needle))
}

/// Returns `(start, end)` of the first `close_tag` (optionally followed by ASCII
/// whitespace) terminated by `>`.
fn find_rawtext_close_tag(haystack: &str, close_tag: &[u8]) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let n = close_tag.len();
    let mut i = 0;
    while i + n <= bytes.len() {
        i += memchr(b'<', &bytes[i..])?;
        if starts_with_ignore_ascii_case_at(bytes, i, close_tag) {
            let mut k = i + n;
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < bytes.len() && bytes[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

/// Tokenizes a markup fragment; names are interned in the stream's atom table.
pub fn tokenize(input: &str) -> TokenStream {
    let mut scanner = Scanner {
        input,
        bytes: input.as_bytes(),
        pos: 0,
        atoms: AtomTable::new(),
        out: Vec::new(),
    };
    scanner.run();
    TokenStream::new(scanner.out, scanner.atoms)
}

// Slices are only cut at ASCII structural bytes or after ASCII-only name runs,
// so every slice endpoint is a UTF-8 char boundary.
struct Scanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    atoms: AtomTable,
    out: Vec<Token>,
}

impl Scanner<'_> {
    fn run(&mut self) {
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] != b'<' {
                self.text();
                continue;
            }
            let keep_going = if self.input[self.pos..].starts_with(COMMENT_START) {
                self.comment()
            } else if starts_with_ignore_ascii_case_at(self.bytes, self.pos, b"<!doctype") {
                self.doctype()
            } else if self.bytes.get(self.pos + 1) == Some(&b'/') {
                self.end_tag();
                true
            } else if self.bytes.get(self.pos + 1).copied().is_some_and(is_name_byte) {
                self.start_tag()
            } else {
                // A lone `<` is literal text.
                self.literal_lt();
                true
            };
            if !keep_going {
                break;
            }
        }
    }

    fn text(&mut self) {
        let input = self.input;
        let start = self.pos;
        let end = memchr(b'<', &self.bytes[start..]).map_or(self.bytes.len(), |rel| start + rel);
        self.pos = end;
        self.push_text(&input[start..end]);
    }

    fn literal_lt(&mut self) {
        self.pos += 1;
        let start = self.pos;
        let end = memchr(b'<', &self.bytes[start..]).map_or(self.bytes.len(), |rel| start + rel);
        self.pos = end;
        let text = format!("<{}", &self.input[start..end]);
        self.push_text(&text);
    }

    fn push_text(&mut self, raw: &str) {
        let decoded = decode_entities(raw);
        if decoded.is_empty() {
            return;
        }
        // Coalesce with a preceding text token (e.g. after a literal `<`).
        if let Some(Token::Text(previous)) = self.out.last_mut() {
            previous.push_str(&decoded);
        } else {
            self.out.push(Token::Text(decoded));
        }
    }

    fn comment(&mut self) -> bool {
        let body_start = self.pos + COMMENT_START.len();
        match self.input[body_start..].find(COMMENT_END) {
            Some(rel) => {
                let body = &self.input[body_start..body_start + rel];
                self.out.push(Token::Comment(body.to_string()));
                self.pos = body_start + rel + COMMENT_END.len();
                true
            }
            None => {
                self.out
                    .push(Token::Comment(self.input[body_start..].to_string()));
                self.pos = self.bytes.len();
                false
            }
        }
    }

    fn doctype(&mut self) -> bool {
        let rest = &self.input[self.pos + 2..];
        let Some(end) = rest.find('>') else {
            self.pos = self.bytes.len();
            return false;
        };
        self.out.push(Token::Doctype(rest[..end].trim().to_string()));
        self.pos += 2 + end + 1;
        true
    }

    fn name(&mut self) -> AtomId {
        let start = self.pos;
        while self.pos < self.bytes.len() && is_name_byte(self.bytes[self.pos]) {
            self.pos += 1;
        }
        self.atoms.intern_ascii_lowercase(&self.input[start..self.pos])
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn end_tag(&mut self) {
        self.pos += 2;
        let name = self.name();
        match memchr(b'>', &self.bytes[self.pos..]) {
            Some(rel) => self.pos += rel + 1,
            None => self.pos = self.bytes.len(),
        }
        self.out.push(Token::EndTag(name));
    }

    fn start_tag(&mut self) -> bool {
        self.pos += 1;
        let name = self.name();
        let mut attributes = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            let Some(&b) = self.bytes.get(self.pos) else {
                break;
            };
            match b {
                b'>' => {
                    self.pos += 1;
                    break;
                }
                b'/' if self.bytes.get(self.pos + 1) == Some(&b'>') => {
                    self_closing = true;
                    self.pos += 2;
                    break;
                }
                b if is_name_byte(b) => {
                    let attribute = self.name();
                    let value = self.attribute_value();
                    attributes.push((attribute, value));
                }
                _ => self.pos += 1,
            }
        }

        let name_str = self.atoms.resolve(name);
        let rawtext_close = match name_str {
            "script" => Some(SCRIPT_CLOSE_TAG),
            "style" => Some(STYLE_CLOSE_TAG),
            _ => None,
        };
        let self_closing = self_closing || is_void_element(name_str);
        self.out.push(Token::StartTag {
            name,
            attributes,
            self_closing,
        });

        match rawtext_close {
            Some(close_tag) if !self_closing => self.rawtext(name, close_tag),
            _ => true,
        }
    }

    fn attribute_value(&mut self) -> Option<String> {
        self.skip_whitespace();
        if self.bytes.get(self.pos) != Some(&b'=') {
            return None;
        }
        self.pos += 1;
        self.skip_whitespace();
        match self.bytes.get(self.pos) {
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                self.pos += 1;
                let start = self.pos;
                let end = memchr(quote, &self.bytes[start..])
                    .map_or(self.bytes.len(), |rel| start + rel);
                self.pos = (end + 1).min(self.bytes.len());
                Some(decode_entities(&self.input[start..end]))
            }
            _ => {
                let start = self.pos;
                while let Some(&b) = self.bytes.get(self.pos) {
                    let closes = b == b'/' && self.bytes.get(self.pos + 1) == Some(&b'>');
                    if b.is_ascii_whitespace() || b == b'>' || closes {
                        break;
                    }
                    self.pos += 1;
                }
                Some(decode_entities(&self.input[start..self.pos]))
            }
        }
    }

    /// Raw text up to the matching close tag; a missing close tag takes the rest
    /// of the input and still emits the end tag.
    fn rawtext(&mut self, name: AtomId, close_tag: &[u8]) -> bool {
        let body = &self.input[self.pos..];
        let (raw, next, keep_going) = match find_rawtext_close_tag(body, close_tag) {
            Some((start, end)) => (&body[..start], self.pos + end, true),
            None => (body, self.bytes.len(), false),
        };
        if !raw.is_empty() {
            self.out.push(Token::Text(raw.to_string()));
        }
        self.out.push(Token::EndTag(name));
        self.pos = next;
        keep_going
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(stream: &TokenStream) -> Vec<String> {
        let atoms = stream.atoms();
        stream
            .iter()
            .filter_map(|token| match token {
                Token::StartTag { name, .. } => Some(atoms.resolve(*name).to_string()),
                Token::EndTag(name) => Some(format!("/{}", atoms.resolve(*name))),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn tokenize_preserves_utf8_text_nodes() {
        let stream = tokenize("<p>120×32</p>");
        assert!(
            stream
                .iter()
                .any(|t| matches!(t, Token::Text(s) if s == "120×32")),
            "expected UTF-8 text token, got: {stream:?}"
        );
    }

    #[test]
    fn tokenize_reads_quoted_unquoted_and_boolean_attributes() {
        let stream = tokenize(r#"<input TYPE=checkbox checked data-x='a b' title="&lt;hi&gt;">"#);
        let atoms = stream.atoms();
        let Some(Token::StartTag {
            name,
            attributes,
            self_closing,
        }) = stream.tokens().first()
        else {
            panic!("expected start tag, got: {stream:?}");
        };
        assert_eq!(atoms.resolve(*name), "input");
        assert!(*self_closing, "void elements are self-closing");
        let resolved: Vec<(&str, Option<&str>)> = attributes
            .iter()
            .map(|(k, v)| (atoms.resolve(*k), v.as_deref()))
            .collect();
        assert_eq!(
            resolved,
            vec![
                ("type", Some("checkbox")),
                ("checked", None),
                ("data-x", Some("a b")),
                ("title", Some("<hi>")),
            ]
        );
    }

    #[test]
    fn tokenize_handles_self_closing_syntax() {
        let stream = tokenize("<div><span/><br></div>");
        assert_eq!(names(&stream), vec!["div", "span", "br", "/div"]);
        assert!(matches!(
            stream.tokens()[1],
            Token::StartTag {
                self_closing: true,
                ..
            }
        ));
    }

    #[test]
    fn tokenize_finds_script_end_tag_case_insensitive() {
        let stream = tokenize("<script>if (a < b) {}</ScRiPt >");
        let atoms = stream.atoms();
        assert!(
            matches!(
                stream.tokens(),
                [
                    Token::StartTag { name, .. },
                    Token::Text(body),
                    Token::EndTag(end)
                ] if atoms.resolve(*name) == "script"
                    && body == "if (a < b) {}"
                    && atoms.resolve(*end) == "script"
            ),
            "expected raw script text and matching end tag, got: {stream:?}"
        );
    }

    #[test]
    fn rawtext_close_tag_does_not_accept_near_matches() {
        let stream = tokenize("<style>a{}</stylex>b{}</style>");
        assert!(
            stream
                .iter()
                .any(|t| matches!(t, Token::Text(s) if s == "a{}</stylex>b{}")),
            "expected near-match to stay text, got: {stream:?}"
        );
    }

    #[test]
    fn tokenize_handles_rawtext_without_close_tag() {
        let stream = tokenize("<style>body { color: red }");
        assert_eq!(names(&stream), vec!["style", "/style"]);
    }

    #[test]
    fn tokenize_keeps_comments_and_doctypes_as_tokens() {
        let stream = tokenize("<!DOCTYPE html><!-- note --><p></p>");
        assert!(matches!(&stream.tokens()[0], Token::Doctype(d) if d == "DOCTYPE html"));
        assert!(matches!(&stream.tokens()[1], Token::Comment(c) if c == " note "));
    }

    #[test]
    fn tokenize_treats_lone_angle_bracket_as_text() {
        let stream = tokenize("<p>1 < 2</p>");
        assert!(
            stream
                .iter()
                .any(|t| matches!(t, Token::Text(s) if s == "1 < 2")),
            "expected literal `<` inside text, got: {stream:?}"
        );
    }

    #[test]
    fn tokenize_allows_custom_element_and_namespaced_tags() {
        let stream = tokenize("<my-card></my-card><svg:rect></svg:rect>");
        assert_eq!(
            names(&stream),
            vec!["my-card", "/my-card", "svg:rect", "/svg:rect"]
        );
    }

    #[test]
    fn tokenize_handles_many_simple_tags_linearly() {
        let input = "<a></a>".repeat(20_000);
        let stream = tokenize(&input);
        assert_eq!(stream.tokens().len(), 40_000);
    }

    #[test]
    fn tokenize_handles_tons_of_angle_brackets() {
        let input = "<".repeat(200_000);
        let stream = tokenize(&input);
        assert_eq!(stream.tokens().len(), 1);
    }
}

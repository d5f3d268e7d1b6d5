//! Page text reconstruction from content streams
//!
//! Strings are decoded with the font selected by `Tf` (ToUnicode CMap when
//! present, otherwise WinAnsi with `/Differences`). Line breaks follow the
//! text position, so the lines of a page drawn inside a single `BT … ET`
//! block stay on separate lines.

use crate::error::SplitError;
use lazy_static::lazy_static;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

/// Vertical movement, in user space units, that starts a new line
const LINE_TOLERANCE: f64 = 1.0;

/// `TJ` adjustment (thousandths of an em) read as a word gap
const WORD_GAP: f64 = -100.0;

/// Largest `bfrange` expanded from a ToUnicode CMap
const MAX_CMAP_RANGE: u32 = 0x1_0000;

/// Page-tree levels searched for inherited resources
const MAX_TREE_DEPTH: usize = 32;

lazy_static! {
    static ref BFCHAR_SECTION: Regex = Regex::new(r"(?s)beginbfchar(.*?)endbfchar").unwrap();
    static ref BFRANGE_SECTION: Regex = Regex::new(r"(?s)beginbfrange(.*?)endbfrange").unwrap();
    static ref CODESPACE: Regex =
        Regex::new(r"(?s)begincodespacerange\s*<([0-9A-Fa-f]+)>").unwrap();
    static ref CMAP_TOKEN: Regex = Regex::new(r"<([0-9A-Fa-f\s]*)>|(\[)|(\])").unwrap();
}

/// Visible text of one page, one output line per visual line
pub(crate) fn page_text(doc: &Document, page_id: ObjectId) -> Result<String, SplitError> {
    let content = doc
        .get_page_content(page_id)
        .map_err(|e| SplitError::OperationError(e.to_string()))?;
    let operations = Content::decode(&content)
        .map_err(|e| SplitError::OperationError(e.to_string()))?
        .operations;

    let fonts = page_fonts(doc, page_id);
    let mut cursor = TextCursor::default();
    let mut font: Option<&FontDecoder> = None;

    for op in &operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => cursor.begin_text(),
            "Tf" => {
                font = operands
                    .first()
                    .and_then(|name| name.as_name().ok())
                    .and_then(|name| fonts.get(name));
            }
            "Td" => cursor.move_by(number(operands, 0), number(operands, 1)),
            "TD" => {
                cursor.leading = -number(operands, 1);
                cursor.move_by(number(operands, 0), number(operands, 1));
            }
            "TL" => cursor.leading = number(operands, 0),
            "Tm" => cursor.set_matrix(
                number(operands, 0),
                number(operands, 3),
                number(operands, 4),
                number(operands, 5),
            ),
            "T*" => cursor.next_line(),
            "Tj" | "TJ" => {
                if let Some(operand) = operands.first() {
                    cursor.show(&decode_operand(font, operand));
                }
            }
            "'" => {
                cursor.next_line();
                if let Some(operand) = operands.first() {
                    cursor.show(&decode_operand(font, operand));
                }
            }
            "\"" => {
                cursor.next_line();
                if let Some(operand) = operands.get(2) {
                    cursor.show(&decode_operand(font, operand));
                }
            }
            _ => {}
        }
    }

    Ok(cursor.finish())
}

fn number(operands: &[Object], index: usize) -> f64 {
    match operands.get(index) {
        Some(Object::Integer(n)) => *n as f64,
        Some(Object::Real(n)) => *n as f64,
        _ => 0.0,
    }
}

/// Tracks the text line origin and joins shown strings into lines
#[derive(Debug)]
struct TextCursor {
    x: f64,
    y: f64,
    scale_x: f64,
    scale_y: f64,
    leading: f64,
    /// Line origin of the last shown string
    last_y: Option<f64>,
    /// A positioning operator ran since the last shown string
    moved: bool,
    /// `T*` without leading: position unknown, assume a new line
    forced_break: bool,
    text: String,
}

impl Default for TextCursor {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            leading: 0.0,
            last_y: None,
            moved: false,
            forced_break: false,
            text: String::new(),
        }
    }
}

impl TextCursor {
    fn begin_text(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
        self.scale_x = 1.0;
        self.scale_y = 1.0;
        self.moved = true;
    }

    fn move_by(&mut self, tx: f64, ty: f64) {
        self.x += tx * self.scale_x;
        self.y += ty * self.scale_y;
        self.moved = true;
    }

    fn set_matrix(&mut self, a: f64, d: f64, e: f64, f: f64) {
        self.scale_x = if a == 0.0 { 1.0 } else { a };
        self.scale_y = if d == 0.0 { 1.0 } else { d };
        self.x = e;
        self.y = f;
        self.moved = true;
    }

    fn next_line(&mut self) {
        if self.leading == 0.0 {
            self.forced_break = true;
        } else {
            self.move_by(0.0, -self.leading);
        }
        self.moved = true;
    }

    fn show(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if let Some(last_y) = self.last_y {
            if self.forced_break || (self.y - last_y).abs() > LINE_TOLERANCE {
                self.text.push('\n');
            } else if self.moved
                && !self.text.ends_with(char::is_whitespace)
                && !s.starts_with(char::is_whitespace)
            {
                self.text.push(' ');
            }
        }
        self.text.push_str(s);
        self.last_y = Some(self.y);
        self.moved = false;
        self.forced_break = false;
    }

    fn finish(mut self) -> String {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text
    }
}

fn decode_operand(font: Option<&FontDecoder>, operand: &Object) -> String {
    let decode = |bytes: &[u8]| match font {
        Some(font) => font.decode(bytes),
        None => decode_string_bytes(bytes),
    };

    match operand {
        Object::String(bytes, _) => decode(bytes.as_slice()),
        Object::Array(items) => {
            let mut text = String::new();
            for item in items {
                match item {
                    Object::String(bytes, _) => text.push_str(&decode(bytes.as_slice())),
                    Object::Integer(n) if (*n as f64) < WORD_GAP => push_gap(&mut text),
                    Object::Real(n) if (*n as f64) < WORD_GAP => push_gap(&mut text),
                    _ => {}
                }
            }
            text
        }
        _ => String::new(),
    }
}

fn push_gap(text: &mut String) {
    if !text.is_empty() && !text.ends_with(' ') {
        text.push(' ');
    }
}

/// Strings shown with a font missing from the page resources:
/// UTF-16BE with BOM, then UTF-8, then Latin-1
fn decode_string_bytes(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        if let Ok(s) = String::from_utf16(&units) {
            return s;
        }
    }
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    bytes.iter().map(|&b| b as char).collect()
}

// ============================================================================
// Fonts
// ============================================================================

#[derive(Debug)]
enum FontDecoder {
    ToUnicode(CMap),
    /// WinAnsi, overridden by the font's `/Differences`
    SingleByte(HashMap<u8, char>),
}

impl FontDecoder {
    fn from_font(doc: &Document, font: &Dictionary) -> Self {
        let cmap = font
            .get(b"ToUnicode")
            .ok()
            .and_then(|obj| stream_bytes(doc, obj))
            .map(|bytes| CMap::parse(&bytes))
            .filter(|cmap| !cmap.map.is_empty());
        if let Some(cmap) = cmap {
            return FontDecoder::ToUnicode(cmap);
        }

        let differences = font
            .get(b"Encoding")
            .ok()
            .and_then(|encoding| resolve_dict(doc, encoding))
            .and_then(|encoding| encoding.get(b"Differences").ok())
            .and_then(|differences| differences.as_array().ok())
            .map(|items| parse_differences(items))
            .unwrap_or_default();
        FontDecoder::SingleByte(differences)
    }

    fn decode(&self, bytes: &[u8]) -> String {
        match self {
            FontDecoder::ToUnicode(cmap) => cmap.decode(bytes),
            FontDecoder::SingleByte(differences) => bytes
                .iter()
                .map(|b| differences.get(b).copied().unwrap_or_else(|| win_ansi_char(*b)))
                .collect(),
        }
    }
}

/// Fonts visible on a page, including resources inherited from the page tree
fn page_fonts(doc: &Document, page_id: ObjectId) -> BTreeMap<Vec<u8>, FontDecoder> {
    let mut fonts = BTreeMap::new();
    let mut node = doc.get_dictionary(page_id).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let Some(dict) = node else {
            break;
        };

        let font_dict = dict
            .get(b"Resources")
            .ok()
            .and_then(|resources| resolve_dict(doc, resources))
            .and_then(|resources| resources.get(b"Font").ok())
            .and_then(|font| resolve_dict(doc, font));

        if let Some(font_dict) = font_dict {
            for (name, font) in font_dict.iter() {
                if fonts.contains_key(name) {
                    continue;
                }
                if let Some(font) = resolve_dict(doc, font) {
                    fonts.insert(name.clone(), FontDecoder::from_font(doc, font));
                }
            }
        }

        node = dict
            .get(b"Parent")
            .ok()
            .and_then(|parent| resolve_dict(doc, parent));
    }

    fonts
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn stream_bytes(doc: &Document, obj: &Object) -> Option<Vec<u8>> {
    let stream = match obj {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_stream().ok()?,
        Object::Stream(stream) => stream,
        _ => return None,
    };
    Some(
        stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone()),
    )
}

/// `[code /name /name code /name …]`
fn parse_differences(items: &[Object]) -> HashMap<u8, char> {
    let mut map = HashMap::new();
    let mut code: Option<i64> = None;
    for item in items {
        match item {
            Object::Integer(n) => code = Some(*n),
            Object::Name(name) => {
                if let Some(c) = code {
                    if let (Ok(byte), Some(ch)) = (u8::try_from(c), glyph_char(name)) {
                        map.insert(byte, ch);
                    }
                    code = Some(c + 1);
                }
            }
            _ => {}
        }
    }
    map
}

/// Glyph names that show up in Spanish-language documents
const GLYPH_NAMES: &[(&str, char)] = &[
    ("space", ' '),
    ("hyphen", '-'),
    ("period", '.'),
    ("comma", ','),
    ("colon", ':'),
    ("slash", '/'),
    ("zero", '0'),
    ("one", '1'),
    ("two", '2'),
    ("three", '3'),
    ("four", '4'),
    ("five", '5'),
    ("six", '6'),
    ("seven", '7'),
    ("eight", '8'),
    ("nine", '9'),
    ("aacute", 'á'),
    ("eacute", 'é'),
    ("iacute", 'í'),
    ("oacute", 'ó'),
    ("uacute", 'ú'),
    ("udieresis", 'ü'),
    ("ntilde", 'ñ'),
    ("Aacute", 'Á'),
    ("Eacute", 'É'),
    ("Iacute", 'Í'),
    ("Oacute", 'Ó'),
    ("Uacute", 'Ú'),
    ("Udieresis", 'Ü'),
    ("Ntilde", 'Ñ'),
    ("ordfeminine", 'ª'),
    ("ordmasculine", 'º'),
    ("degree", '°'),
];

fn glyph_char(name: &[u8]) -> Option<char> {
    if let [single] = name {
        if single.is_ascii_alphabetic() {
            return Some(*single as char);
        }
    }
    let name = std::str::from_utf8(name).ok()?;
    GLYPH_NAMES
        .iter()
        .find(|(glyph, _)| *glyph == name)
        .map(|(_, ch)| *ch)
}

/// WinAnsiEncoding: Latin-1 except for the 0x80–0x9F block
fn win_ansi_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        other => other as char,
    }
}

// ============================================================================
// ToUnicode CMaps
// ============================================================================

#[derive(Debug, Default)]
struct CMap {
    /// Bytes per character code
    code_len: usize,
    map: HashMap<u32, String>,
}

enum CMapToken {
    Hex(Vec<u8>),
    Open,
    Close,
}

impl CMap {
    fn parse(bytes: &[u8]) -> Self {
        let source = String::from_utf8_lossy(bytes);
        let mut cmap = CMap {
            code_len: CODESPACE
                .captures(&source)
                .map(|caps| caps[1].len().div_ceil(2))
                .unwrap_or(0),
            map: HashMap::new(),
        };

        for section in BFCHAR_SECTION.captures_iter(&source) {
            let tokens = cmap_tokens(&section[1]);
            for pair in tokens.chunks_exact(2) {
                if let [CMapToken::Hex(src), CMapToken::Hex(dst)] = pair {
                    cmap.insert(src, utf16_string(dst));
                }
            }
        }

        for section in BFRANGE_SECTION.captures_iter(&source) {
            cmap.parse_ranges(&cmap_tokens(&section[1]));
        }

        if cmap.code_len == 0 {
            cmap.code_len = 1;
        }
        cmap
    }

    fn insert(&mut self, src: &[u8], value: String) {
        self.code_len = self.code_len.max(src.len());
        self.map.insert(code_of(src), value);
    }

    fn parse_ranges(&mut self, tokens: &[CMapToken]) {
        let mut iter = tokens.iter();
        while let (Some(CMapToken::Hex(lo)), Some(CMapToken::Hex(hi))) = (iter.next(), iter.next())
        {
            let (lo_code, hi_code) = (code_of(lo), code_of(hi));
            if hi_code < lo_code || hi_code - lo_code >= MAX_CMAP_RANGE {
                break;
            }
            self.code_len = self.code_len.max(lo.len());

            match iter.next() {
                Some(CMapToken::Hex(dst)) => {
                    let units = utf16_units(dst);
                    for (offset, code) in (lo_code..=hi_code).enumerate() {
                        let mut shifted = units.clone();
                        if let Some(last) = shifted.last_mut() {
                            *last = last.wrapping_add(offset as u16);
                        }
                        self.map.insert(code, String::from_utf16_lossy(&shifted));
                    }
                }
                Some(CMapToken::Open) => {
                    let mut code = lo_code;
                    for token in iter.by_ref() {
                        match token {
                            CMapToken::Hex(dst) => {
                                self.map.insert(code, utf16_string(dst));
                                code += 1;
                            }
                            _ => break,
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn decode(&self, bytes: &[u8]) -> String {
        bytes
            .chunks(self.code_len.max(1))
            .filter_map(|chunk| self.map.get(&code_of(chunk)))
            .map(String::as_str)
            .collect()
    }
}

fn cmap_tokens(section: &str) -> Vec<CMapToken> {
    CMAP_TOKEN
        .captures_iter(section)
        .map(|caps| {
            if let Some(hex) = caps.get(1) {
                CMapToken::Hex(hex_bytes(hex.as_str()))
            } else if caps.get(2).is_some() {
                CMapToken::Open
            } else {
                CMapToken::Close
            }
        })
        .collect()
}

fn hex_bytes(hex: &str) -> Vec<u8> {
    let digits: Vec<u8> = hex
        .chars()
        .filter_map(|c| c.to_digit(16))
        .map(|d| d as u8)
        .collect();
    digits
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => hi << 4 | lo,
            [hi] => hi << 4,
            _ => 0,
        })
        .collect()
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => u16::from(*single),
            _ => 0,
        })
        .collect()
}

fn utf16_string(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

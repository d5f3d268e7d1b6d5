//! In-memory PDF fixtures

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// Column offset of a `\t`-separated cell in [`pdf_with_text_blocks`]
const CELL_WIDTH: i64 = 150;

/// Line spacing used by every fixture
const LINE_HEIGHT: i64 = 16;

/// How [`pdf_with_text_blocks`] declares and encodes its font
#[derive(Debug, Clone, Copy)]
pub enum FontKind {
    /// Simple font with WinAnsiEncoding, declared on each page
    WinAnsi,
    /// Two-byte Identity-H font with a ToUnicode CMap, declared on the page
    /// tree root and inherited by the pages
    ToUnicode,
}

/// Build a PDF whose page `i` shows the lines of `pages[i]`, one text
/// object per line, with no font resources
pub fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let contents = pages
        .iter()
        .map(|lines| {
            let mut operations = Vec::new();
            for (i, line) in lines.iter().enumerate() {
                operations.push(Operation::new("BT", vec![]));
                operations.push(select_font());
                operations.push(Operation::new(
                    "Td",
                    vec![
                        Object::Integer(72),
                        Object::Integer(720 - LINE_HEIGHT * i as i64),
                    ],
                ));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(line.as_bytes().to_vec(), StringFormat::Literal)],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            operations
        })
        .collect();

    assemble(doc, pages_id, contents, None, None)
}

/// Build a PDF whose pages are each drawn as a single `BT … ET` block:
/// lines are separated by relative `Td` moves and a `\t` inside a line
/// starts a cell on the same baseline
pub fn pdf_with_text_blocks(pages: &[&[&str]], font: FontKind) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = match font {
        FontKind::WinAnsi => doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ])),
        FontKind::ToUnicode => {
            let cmap_id = doc.add_object(Stream::new(Dictionary::new(), to_unicode_cmap()));
            doc.add_object(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Font".to_vec())),
                ("Subtype", Object::Name(b"Type0".to_vec())),
                ("BaseFont", Object::Name(b"ArialMT".to_vec())),
                ("Encoding", Object::Name(b"Identity-H".to_vec())),
                ("ToUnicode", Object::Reference(cmap_id)),
            ]))
        }
    };
    let resources = Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )]);

    let contents = pages
        .iter()
        .map(|lines| {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                select_font(),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(720)]),
            ];
            let mut x_offset = 0;
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    operations.push(Operation::new(
                        "Td",
                        vec![Object::Integer(-x_offset), Object::Integer(-LINE_HEIGHT)],
                    ));
                    x_offset = 0;
                }
                for (j, cell) in line.split('\t').enumerate() {
                    if j > 0 {
                        operations.push(Operation::new(
                            "Td",
                            vec![Object::Integer(CELL_WIDTH), Object::Integer(0)],
                        ));
                        x_offset += CELL_WIDTH;
                    }
                    operations.push(Operation::new(
                        "Tj",
                        vec![Object::String(encode(cell, font), StringFormat::Hexadecimal)],
                    ));
                }
            }
            operations.push(Operation::new("ET", vec![]));
            operations
        })
        .collect();

    match font {
        FontKind::WinAnsi => assemble(doc, pages_id, contents, Some(resources), None),
        FontKind::ToUnicode => assemble(doc, pages_id, contents, None, Some(resources)),
    }
}

fn select_font() -> Operation {
    Operation::new(
        "Tf",
        vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
    )
}

fn encode(text: &str, font: FontKind) -> Vec<u8> {
    match font {
        FontKind::WinAnsi => text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap())
            .collect(),
        FontKind::ToUnicode => text
            .chars()
            .flat_map(|c| u16::try_from(u32::from(c)).unwrap().to_be_bytes())
            .collect(),
    }
}

/// Codes 0x0020..=0x00FF map to the same code point
fn to_unicode_cmap() -> Vec<u8> {
    b"/CIDInit /ProcSet findresource begin\n\
      12 dict begin\n\
      begincmap\n\
      /CMapName /Adobe-Identity-UCS def\n\
      /CMapType 2 def\n\
      1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n\
      1 beginbfrange\n<0020> <00FF> <0020>\nendbfrange\n\
      endcmap\n\
      CMapName currentdict /CMap defineresource pop\n\
      end\nend\n"
        .to_vec()
}

fn assemble(
    mut doc: Document,
    pages_id: ObjectId,
    contents: Vec<Vec<Operation>>,
    page_resources: Option<Dictionary>,
    tree_resources: Option<Dictionary>,
) -> Vec<u8> {
    let mut page_ids = Vec::new();
    for operations in contents {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

        let mut page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
        ]);
        if let Some(resources) = &page_resources {
            page.set("Resources", Object::Dictionary(resources.clone()));
        }
        page_ids.push(doc.add_object(page));
    }

    let mut pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    if let Some(resources) = tree_resources {
        pages_dict.set("Resources", Object::Dictionary(resources));
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

//! Document construction
//!
//! A thin layer over `lopdf` for the few things generated documents need:
//! A4 pages, greyscale raster images, and Helvetica-Bold text.

use image::GrayImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::PdfError;

/// A4 width in points
pub const A4_WIDTH: f32 = 595.28;

/// A4 height in points
pub const A4_HEIGHT: f32 = 841.89;

const FONT_RESOURCE: &str = "F1";

/// Accumulates drawing operations for a single page
#[derive(Debug, Clone)]
pub struct PageCanvas {
    width: f32,
    height: f32,
    operations: Vec<Operation>,
    images: Vec<ObjectId>,
}

impl PageCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            operations: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn a4() -> Self {
        Self::new(A4_WIDTH, A4_HEIGHT)
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Draw an image embedded with [`DocumentBuilder::embed_gray_image`]
    ///
    /// `(x, y)` is the lower-left corner in points.
    pub fn draw_image(&mut self, image: ObjectId, x: f32, y: f32, width: f32, height: f32) {
        if !self.images.contains(&image) {
            self.images.push(image);
        }
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(width),
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(height),
                    Object::Real(x),
                    Object::Real(y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(image_resource_name(image).into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
    }

    /// Draw black Helvetica-Bold text with its baseline starting at `(x, y)`
    pub fn draw_text(&mut self, text: &str, x: f32, y: f32, size: f32) {
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("rg", vec![Object::Real(0.0), Object::Real(0.0), Object::Real(0.0)]),
            Operation::new(
                "Tf",
                vec![Object::Name(FONT_RESOURCE.as_bytes().to_vec()), Object::Real(size)],
            ),
            Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Draw text horizontally centred on `center_x`
    pub fn draw_text_centered(&mut self, text: &str, center_x: f32, y: f32, size: f32) {
        let x = center_x - text_width(text, size) / 2.0;
        self.draw_text(text, x, y, size);
    }

    /// Stroke a black line
    pub fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), thickness: f32) {
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new("w", vec![Object::Real(thickness)]),
            Operation::new("RG", vec![Object::Real(0.0), Object::Real(0.0), Object::Real(0.0)]),
            Operation::new("m", vec![Object::Real(from.0), Object::Real(from.1)]),
            Operation::new("l", vec![Object::Real(to.0), Object::Real(to.1)]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }
}

fn image_resource_name(id: ObjectId) -> String {
    format!("Im{}", id.0)
}

/// Builds a fresh document page by page
pub struct DocumentBuilder {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        Self {
            doc,
            pages_id,
            font_id,
            kids: Vec::new(),
        }
    }

    /// Embed an 8-bit greyscale raster as an image XObject
    pub fn embed_gray_image(&mut self, image: &GrayImage) -> ObjectId {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(image.width() as i64),
            "Height" => Object::Integer(image.height() as i64),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => Object::Integer(8),
        };
        self.doc.add_object(Stream::new(dict, image.as_raw().clone()))
    }

    /// Append a page
    pub fn add_page(&mut self, page: PageCanvas) -> Result<ObjectId, PdfError> {
        let content = Content {
            operations: page.operations,
        };
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.encode()?));

        let mut xobjects = Dictionary::new();
        for image in &page.images {
            xobjects.set(image_resource_name(*image), Object::Reference(*image));
        }

        let resources = dictionary! {
            "Font" => dictionary! { FONT_RESOURCE => self.font_id },
            "XObject" => xobjects,
        };

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page.width),
                Object::Real(page.height),
            ],
            "Resources" => resources,
            "Contents" => content_id,
        });

        self.kids.push(page_id);
        Ok(page_id)
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Finish the page tree and catalog
    pub fn into_document(mut self) -> Document {
        let count = self.kids.len() as i64;
        let kids: Vec<Object> = self.kids.into_iter().map(Object::Reference).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(count),
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc
    }

    /// Finish and serialize with compressed streams
    pub fn to_bytes(self) -> Result<Vec<u8>, PdfError> {
        save_document(self.into_document())
    }
}

/// Compress and serialize a document
pub fn save_document(mut doc: Document) -> Result<Vec<u8>, PdfError> {
    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Width of `text` set in Helvetica-Bold at `size` points
///
/// Uses the standard AFM advance widths; characters outside the table count
/// as a digit.
pub fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = text.chars().map(helvetica_bold_advance).sum();
    units as f32 * size / 1000.0
}

fn helvetica_bold_advance(c: char) -> u32 {
    match c {
        ' ' | '.' | ',' | 'I' | 'i' | 'j' | 'l' => 278,
        '-' | 'f' | 't' => 333,
        ':' => 333,
        'r' => 389,
        'z' => 500,
        '0'..='9' | '_' => 556,
        'a' | 'c' | 'e' | 'k' | 's' | 'v' | 'x' | 'y' | 'J' => 556,
        'b' | 'd' | 'g' | 'h' | 'n' | 'o' | 'p' | 'q' | 'u' | 'F' | 'L' | 'T' | 'Z' => 611,
        'E' | 'P' | 'S' | 'V' | 'X' | 'Y' => 667,
        'A' | 'B' | 'C' | 'D' | 'H' | 'K' | 'N' | 'R' | 'U' => 722,
        'w' => 778,
        'G' | 'O' | 'Q' => 778,
        'M' => 833,
        'm' => 889,
        'W' => 944,
        _ => 556,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_support::{image_count, page_labels};
    use crate::pdf::load_document;

    #[test]
    fn test_text_width() {
        // D(722) a(556) y(556) space(278) 1(556)
        let width = text_width("Day 1", 48.0);
        assert!((width - 128.064).abs() < 0.001);
        assert_eq!(text_width("", 12.0), 0.0);
    }

    #[test]
    fn test_builds_pages_in_order() {
        let mut builder = DocumentBuilder::new();
        for label in ["first", "second", "third"] {
            let mut page = PageCanvas::a4();
            page.draw_text(label, 10.0, 10.0, 12.0);
            builder.add_page(page).unwrap();
        }
        assert_eq!(builder.page_count(), 3);

        let bytes = builder.to_bytes().unwrap();
        assert_eq!(page_labels(&bytes), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_document_is_loadable() {
        let bytes = DocumentBuilder::new().to_bytes().unwrap();
        let doc = load_document(&bytes).unwrap();
        assert!(doc.get_pages().is_empty());
    }

    #[test]
    fn test_embedded_image_is_shared() {
        let mut builder = DocumentBuilder::new();
        let raster = GrayImage::from_pixel(4, 4, image::Luma([0u8]));
        let image = builder.embed_gray_image(&raster);

        let mut page = PageCanvas::a4();
        page.draw_image(image, 0.0, 0.0, 100.0, 100.0);
        page.draw_image(image, 200.0, 0.0, 100.0, 100.0);
        builder.add_page(page).unwrap();

        let bytes = builder.to_bytes().unwrap();
        assert_eq!(image_count(&bytes), 1);
    }
}

//! Page-description attribute extraction (static boards).
//!
//! Only the first page is measured. Geometry is read from the page boxes and
//! converted to millimetres; colour and resolution are estimates:
//!
//! - colour comes from a [`ColourSpaceProbe`], by default a scan of the
//!   colour spaces the page declares and of the colour operators its content
//!   streams use (no rendering);
//! - the resolution of each image XObject is estimated as if the image
//!   spanned the whole page, which is conservative for full-bleed artwork and
//!   pessimistic for anything smaller.
//!
//! Form XObjects painted by the page are followed for both estimates, each
//! form once and at most [`MAX_FORM_DEPTH`] levels deep.

use std::collections::HashSet;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use serde::Serialize;
use tracing::{debug, warn};

use super::ExtractError;
use crate::print::PageSize;

/// Nesting limit when following Form XObjects.
pub const MAX_FORM_DEPTH: usize = 8;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageAttributes {
    pub page_count: usize,
    /// MediaBox of the first page.
    pub media: PageSize,
    pub trim: Option<PageSize>,
    pub bleed: Option<PageSize>,
    pub crop: Option<PageSize>,
    pub has_rgb: bool,
    /// Lowest estimated resolution across the page's images; `None` for
    /// vector-only pages.
    pub min_image_dpi: Option<f64>,
}

/// Decides whether a page uses an RGB-family colour space.
pub trait ColourSpaceProbe: Send + Sync {
    fn detects_rgb(&self, doc: &Document, page_id: ObjectId) -> bool;
}

/// Looks for `RGB` in the page and its forms:
///
/// - colour-space names declared in `/Resources /ColorSpace` and on image
///   XObjects;
/// - `rg`/`RG` operators in the content streams;
/// - `cs`/`CS` operators selecting an RGB device or calibrated space.
///
/// Colour spaces that never spell out the token (an ICC profile referenced
/// without an alternate, for one) go unnoticed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenScanProbe;

impl ColourSpaceProbe for TokenScanProbe {
    fn detects_rgb(&self, doc: &Document, page_id: ObjectId) -> bool {
        drawing_scopes(doc, page_id)
            .iter()
            .any(|scope| scope_uses_rgb(doc, scope))
    }
}

/// Reads the attributes of the first page of a PDF.
///
/// Images and colour inside Form XObjects are included; image resolution
/// still assumes every image covers the full page.
pub struct PageExtractor {
    probe: Box<dyn ColourSpaceProbe>,
}

impl PageExtractor {
    pub fn new() -> Self {
        Self::with_probe(Box::new(TokenScanProbe))
    }

    pub fn with_probe(probe: Box<dyn ColourSpaceProbe>) -> Self {
        Self { probe }
    }

    pub fn extract(&self, bytes: &[u8]) -> Result<PageAttributes, ExtractError> {
        let doc = Document::load_mem(bytes)?;
        let pages = doc.get_pages();
        let page_id = *pages
            .values()
            .next()
            .ok_or_else(|| ExtractError::Parse("document has no pages".into()))?;

        let media = inherited(&doc, page_id, b"MediaBox")
            .and_then(|o| read_box(&doc, o))
            .ok_or_else(|| ExtractError::Parse("first page has no usable MediaBox".into()))?;

        // TrimBox and BleedBox are page-only; CropBox inherits like MediaBox.
        let page = doc.get_dictionary(page_id)?;
        let trim = optional_box(&doc, page.get(b"TrimBox").ok(), "TrimBox");
        let bleed = optional_box(&doc, page.get(b"BleedBox").ok(), "BleedBox");
        let crop = optional_box(&doc, inherited(&doc, page_id, b"CropBox"), "CropBox");

        let has_rgb = self.probe.detects_rgb(&doc, page_id);
        let min_image_dpi = estimate_min_dpi(&doc, &drawing_scopes(&doc, page_id), &media);

        let attributes = PageAttributes {
            page_count: pages.len(),
            media,
            trim,
            bleed,
            crop,
            has_rgb,
            min_image_dpi,
        };
        debug!(?attributes, "page attributes extracted");
        Ok(attributes)
    }
}

impl Default for PageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
enum Source<'a> {
    Page(ObjectId),
    Form(&'a Stream),
}

/// Something that draws: the page itself or a Form XObject it reaches.
struct Scope<'a> {
    resources: Option<&'a Dictionary>,
    source: Source<'a>,
}

impl Scope<'_> {
    fn operations(&self, doc: &Document) -> Vec<Operation> {
        let decoded = match self.source {
            Source::Page(page_id) => doc.get_and_decode_page_content(page_id),
            Source::Form(stream) => {
                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                Content::decode(&data)
            }
        };
        match decoded {
            Ok(content) => content.operations,
            Err(e) => {
                debug!(error = %e, "content stream not decodable");
                Vec::new()
            }
        }
    }
}

/// The page scope followed by every Form XObject reachable from it.
/// A form without its own `/Resources` draws with the enclosing ones.
fn drawing_scopes(doc: &Document, page_id: ObjectId) -> Vec<Scope<'_>> {
    let top_level = page_resources(doc, page_id);
    let mut scopes = vec![Scope {
        resources: top_level,
        source: Source::Page(page_id),
    }];

    let mut seen = HashSet::new();
    let mut pending: Vec<(&Dictionary, usize)> = top_level.into_iter().map(|r| (r, 0)).collect();
    while let Some((resources, depth)) = pending.pop() {
        if depth >= MAX_FORM_DEPTH {
            debug!(depth, "form nesting limit reached");
            continue;
        }
        for (id, form) in xobjects(doc, resources) {
            if !matches!(subtype(&form.dict), Some(b"Form")) {
                continue;
            }
            if let Some(id) = id {
                if !seen.insert(id) {
                    continue;
                }
            }
            let own = form.dict.get(b"Resources").ok().and_then(|o| deref_dict(doc, o));
            scopes.push(Scope {
                resources: own.or(Some(resources)),
                source: Source::Form(form),
            });
            if let Some(own) = own {
                pending.push((own, depth + 1));
            }
        }
    }
    scopes
}

fn scope_uses_rgb(doc: &Document, scope: &Scope<'_>) -> bool {
    if let Some(resources) = scope.resources {
        let names = declared_space_names(doc, resources);
        debug!(?names, "declared colour spaces");
        if names.iter().any(|n| is_rgb(n)) {
            return true;
        }
    }

    let operations = scope.operations(doc);
    match operations.iter().find(|op| sets_rgb(op)) {
        Some(op) => {
            debug!(operator = %op.operator, "RGB colour operator");
            true
        }
        None => false,
    }
}

// Named spaces selected by `cs`/`CS` are caught by the declared-name scan.
fn sets_rgb(op: &Operation) -> bool {
    match op.operator.as_str() {
        "rg" | "RG" => true,
        "cs" | "CS" => op
            .operands
            .first()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|name| is_rgb(&String::from_utf8_lossy(name))),
        _ => false,
    }
}

fn is_rgb(name: &str) -> bool {
    name.contains("RGB")
}

/// Colour-space names in `/ColorSpace` and on the image XObjects.
fn declared_space_names(doc: &Document, resources: &Dictionary) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(spaces) = resources.get(b"ColorSpace").ok().and_then(|o| deref_dict(doc, o)) {
        for (_, space) in spaces.iter() {
            collect_space_names(doc, space, &mut names);
        }
    }
    for image in image_xobjects(doc, resources) {
        if let Ok(space) = image.get(b"ColorSpace") {
            collect_space_names(doc, space, &mut names);
        }
    }
    names
}

fn estimate_min_dpi(doc: &Document, scopes: &[Scope<'_>], media: &PageSize) -> Option<f64> {
    let (page_w_in, page_h_in) = (media.width_in(), media.height_in());
    if page_w_in <= 0.0 || page_h_in <= 0.0 {
        return None;
    }

    scopes
        .iter()
        .filter_map(|scope| scope.resources)
        .flat_map(|resources| image_xobjects(doc, resources))
        .filter_map(|image| {
            let width = image.get(b"Width").ok().and_then(|o| number(doc, o))?;
            let height = image.get(b"Height").ok().and_then(|o| number(doc, o))?;
            let dpi = (width / page_w_in).min(height / page_h_in);
            debug!(width, height, dpi, "image resolution estimate");
            Some(dpi)
        })
        .min_by(|a, b| a.total_cmp(b))
}

/// XObject streams in `resources`, with their object ids when indirect.
fn xobjects<'a>(doc: &'a Document, resources: &'a Dictionary) -> impl Iterator<Item = (Option<ObjectId>, &'a Stream)> + 'a {
    resources
        .get(b"XObject")
        .ok()
        .and_then(|o| deref_dict(doc, o))
        .into_iter()
        .flat_map(|xobjects| xobjects.iter())
        .filter_map(move |(_, obj)| match deref(doc, obj)? {
            Object::Stream(stream) => Some((obj.as_reference().ok(), stream)),
            _ => None,
        })
}

/// Dictionaries of the `/Subtype /Image` XObjects in `resources`.
fn image_xobjects<'a>(doc: &'a Document, resources: &'a Dictionary) -> impl Iterator<Item = &'a Dictionary> + 'a {
    xobjects(doc, resources)
        .map(|(_, stream)| &stream.dict)
        .filter(|dict| matches!(subtype(dict), Some(b"Image")))
}

fn subtype(dict: &Dictionary) -> Option<&[u8]> {
    dict.get(b"Subtype").and_then(|s| s.as_name()).ok()
}

fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    inherited(doc, page_id, b"Resources").and_then(|o| deref_dict(doc, o))
}

fn collect_space_names(doc: &Document, space: &Object, names: &mut Vec<String>) {
    match deref(doc, space) {
        Some(Object::Name(name)) => names.push(String::from_utf8_lossy(name).into_owned()),
        Some(Object::Array(items)) => {
            for item in items {
                if let Some(Object::Name(name)) = deref(doc, item) {
                    names.push(String::from_utf8_lossy(name).into_owned());
                }
            }
        }
        _ => {}
    }
}

/// Look up `key` on the page, walking `/Parent` links for inheritable entries.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = page_id;
    // bounded walk; a cyclic page tree simply yields nothing
    for _ in 0..64 {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

fn optional_box(doc: &Document, obj: Option<&Object>, name: &str) -> Option<PageSize> {
    let obj = obj?;
    let size = read_box(doc, obj);
    if size.is_none() {
        warn!(page_box = name, "ignoring malformed page box");
    }
    size
}

fn read_box(doc: &Document, obj: &Object) -> Option<PageSize> {
    let items = match deref(doc, obj)? {
        Object::Array(items) if items.len() == 4 => items,
        _ => return None,
    };
    let mut rect = [0.0; 4];
    for (slot, item) in rect.iter_mut().zip(items) {
        *slot = number(doc, item)?;
    }
    Some(PageSize::from_points_rect(rect))
}

fn number(doc: &Document, obj: &Object) -> Option<f64> {
    match deref(doc, obj)? {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

fn deref<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn deref_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match deref(doc, obj)? {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

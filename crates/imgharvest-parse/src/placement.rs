//! Image placement tracking.
//!
//! Walks a page's content stream with a CTM stack (`q`, `Q`, `cm`) and
//! records where each image XObject is painted (`Do`). Form XObjects are
//! entered with their `/Matrix` applied, up to [`MAX_FORM_DEPTH`] levels.
//! Only the first placement of an image is kept.

use std::collections::HashMap;

use imgharvest_core::{BBox, Ctm, placement_from_ctm};

use crate::error::BackendError;
use crate::lopdf_backend::{decode_stream, object_to_f64, resolve_ref};
use crate::tokenizer::{Operand, tokenize};

/// Form XObjects nested deeper than this are not entered.
pub const MAX_FORM_DEPTH: usize = 12;

/// Collects the first placement of every image painted on a page.
pub(crate) struct PlacementWalker<'a> {
    doc: &'a lopdf::Document,
    page_height: f64,
    placements: HashMap<lopdf::ObjectId, BBox>,
}

impl<'a> PlacementWalker<'a> {
    pub(crate) fn new(doc: &'a lopdf::Document, page_height: f64) -> Self {
        Self {
            doc,
            page_height,
            placements: HashMap::new(),
        }
    }

    pub(crate) fn into_placements(self) -> HashMap<lopdf::ObjectId, BBox> {
        self.placements
    }

    /// Interpret `content` with `resources` in scope, starting from `ctm`.
    pub(crate) fn walk(
        &mut self,
        content: &[u8],
        resources: &lopdf::Dictionary,
        ctm: Ctm,
        depth: usize,
    ) -> Result<(), BackendError> {
        if depth > MAX_FORM_DEPTH {
            return Err(BackendError::Interpreter(format!(
                "Form XObject recursion depth {depth} exceeds limit {MAX_FORM_DEPTH}"
            )));
        }

        let mut ctm = ctm;
        let mut stack: Vec<Ctm> = Vec::new();

        for op in tokenize(content)? {
            match op.name.as_str() {
                "q" => stack.push(ctm),
                "Q" => {
                    if let Some(saved) = stack.pop() {
                        ctm = saved;
                    }
                }
                "cm" => {
                    let values: Vec<f64> =
                        op.operands.iter().filter_map(Operand::as_number).collect();
                    match Ctm::from_slice(&values) {
                        Some(m) => ctm = m.concat(&ctm),
                        None => tracing::debug!(operands = values.len(), "ignoring malformed cm"),
                    }
                }
                "Do" => {
                    if let Some(name) = op.operands.last().and_then(Operand::as_name) {
                        self.handle_do(resources, name, ctm, depth)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_do(
        &mut self,
        resources: &lopdf::Dictionary,
        name: &str,
        ctm: Ctm,
        depth: usize,
    ) -> Result<(), BackendError> {
        let doc = self.doc;
        let Some(xobj_id) = xobject_id(doc, resources, name) else {
            tracing::debug!(name, "Do names an XObject missing from resources");
            return Ok(());
        };
        let Ok(stream) = doc.get_object(xobj_id).and_then(|o| o.as_stream()) else {
            return Ok(());
        };

        let subtype = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .unwrap_or(b"");

        match subtype {
            b"Image" => {
                let page_height = self.page_height;
                self.placements
                    .entry(xobj_id)
                    .or_insert_with(|| placement_from_ctm(&ctm, page_height));
                Ok(())
            }
            b"Form" => {
                let form_ctm = form_matrix(stream)
                    .map(|m| m.concat(&ctm))
                    .unwrap_or(ctm);
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .map(|r| resolve_ref(doc, r))
                    .and_then(|r| r.as_dict().ok())
                    .unwrap_or(resources);
                let content = decode_stream(stream).map_err(|e| {
                    BackendError::Interpreter(format!(
                        "failed to decode Form XObject /{name} stream: {e}"
                    ))
                })?;
                self.walk(&content, form_resources, form_ctm, depth + 1)
            }
            _ => Ok(()),
        }
    }
}

/// Look up `/XObject/<name>` in `resources` and return its object id.
pub(crate) fn xobject_id(
    doc: &lopdf::Document,
    resources: &lopdf::Dictionary,
    name: &str,
) -> Option<lopdf::ObjectId> {
    let xobjects = resources.get(b"XObject").ok()?;
    let xobjects = resolve_ref(doc, xobjects).as_dict().ok()?;
    xobjects.get(name.as_bytes()).ok()?.as_reference().ok()
}

fn form_matrix(stream: &lopdf::Stream) -> Option<Ctm> {
    let arr = stream.dict.get(b"Matrix").ok()?.as_array().ok()?;
    let values: Vec<f64> = arr.iter().filter_map(|o| object_to_f64(o).ok()).collect();
    Ctm::from_slice(&values)
}

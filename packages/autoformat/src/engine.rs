use crate::markers::{MarkerDefinition, MarkerKind};
use overmark_model::{
    Batch, ChangeRecord, CommandParams, Document, Element, Position, Range, Selection,
    TEXT_SENTINEL,
};
use regex::Regex;
use tracing::{debug, trace};

/// Characters that may open a span right after an opening delimiter
/// position: whitespace handled separately, these are the punctuation
/// openers (`(foo *bar*)` etc.)
const OPENING_PUNCT: [char; 5] = ['(', '[', '{', '\'', '"'];

#[derive(Debug)]
struct RegisteredMarker {
    key: String,
    definition: MarkerDefinition,
    /// Anchored prefix pattern, compiled once per block marker.
    prefix_pattern: Option<Regex>,
}

/// Marker Recognition Engine.
///
/// Watches the change-record stream for single typed characters and
/// converts completed markers into formatting-command executions. Only
/// batches shaped like interactive typing are considered: exactly one
/// text insertion of length one, with a collapsed selection right
/// after it. Programmatic edits, pastes and multi-record transactions
/// never trigger a conversion.
#[derive(Debug, Default)]
pub struct MarkerEngine {
    markers: Vec<RegisteredMarker>,
    /// Indices of markers whose command is registered, resolved once
    /// on the first candidate batch.
    resolved: Option<Vec<usize>>,
}

impl MarkerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a marker under `key`. Re-adding an existing key
    /// replaces the definition in place, keeping its position in the
    /// recognition order.
    pub fn add(&mut self, key: impl Into<String>, definition: MarkerDefinition) {
        let key = key.into();
        let prefix_pattern = match &definition.kind {
            MarkerKind::Block { prefix } => {
                let pattern = format!("^{}", regex::escape(prefix));
                Some(Regex::new(&pattern).unwrap_or_else(|e| {
                    panic!("invalid block prefix pattern {:?}: {}", pattern, e)
                }))
            }
            MarkerKind::Inline { .. } => None,
        };
        let entry = RegisteredMarker {
            key: key.clone(),
            definition,
            prefix_pattern,
        };
        match self.markers.iter_mut().find(|m| m.key == key) {
            Some(existing) => *existing = entry,
            None => self.markers.push(entry),
        }
        self.resolved = None;
    }

    /// Inspect one delivered batch and run at most one conversion.
    /// Conversions mutate `doc` through a nested transaction, queueing
    /// a fresh batch for the caller to deliver next.
    pub fn handle_batch(&mut self, doc: &mut Document, batch: &Batch) {
        let Some(caret) = typed_char_caret(doc, batch) else {
            return;
        };
        if doc.in_code_context(&caret) {
            trace!("marker recognition suppressed in code context");
            return;
        }
        if self.resolved.is_none() {
            let indices: Vec<usize> = self
                .markers
                .iter()
                .enumerate()
                .filter(|(_, m)| doc.commands().contains(&m.definition.command))
                .map(|(i, _)| i)
                .collect();
            trace!(candidates = indices.len(), "resolved marker candidates");
            self.resolved = Some(indices);
        }
        let candidates = self.resolved.clone().unwrap_or_default();
        for index in candidates {
            let entry = &self.markers[index];
            let converted = match &entry.definition.kind {
                MarkerKind::Inline { marker } => try_inline(
                    doc,
                    &caret,
                    marker,
                    &entry.definition.command,
                    &entry.definition.params,
                ),
                MarkerKind::Block { prefix } => {
                    let Some(pattern) = &entry.prefix_pattern else {
                        continue;
                    };
                    try_block(
                        doc,
                        &caret,
                        prefix,
                        pattern,
                        &entry.definition.command,
                        &entry.definition.params,
                    )
                }
            };
            if converted {
                return;
            }
        }
    }
}

/// Caret position when `batch` is a single interactively typed
/// character in the block the selection sits in, `None` otherwise.
fn typed_char_caret(doc: &Document, batch: &Batch) -> Option<Position> {
    let [ChangeRecord::Insert {
        position,
        name,
        length,
    }] = batch.records.as_slice()
    else {
        return None;
    };
    if name != TEXT_SENTINEL || *length != 1 {
        return None;
    }
    let selection = doc.selection();
    if !selection.is_collapsed() {
        return None;
    }
    let (_, record_parent) = position.split_last()?;
    if record_parent != selection.start.parent.as_slice() {
        return None;
    }
    Some(selection.start.clone())
}

/// Try one inline marker against the text ending at the caret.
///
/// The closing delimiter must end exactly at the caret, preceded by a
/// non-whitespace character that is not the delimiter's own first
/// character. The opening delimiter is searched right-to-left inside
/// the same text run (formatting boundaries stop the scan), at the
/// rightmost position preceded by nothing (block start), whitespace or
/// opening punctuation, with at least one character of content between
/// the delimiters. The scan never needs to cross into sibling runs:
/// the writer merges adjacent runs with identical attribute sets, so
/// any text sibling necessarily carries different formatting and would
/// stop the scan anyway.
fn try_inline(
    doc: &mut Document,
    caret: &Position,
    marker: &str,
    command: &str,
    params: &CommandParams,
) -> bool {
    let mchars: Vec<char> = marker.chars().collect();
    let mlen = mchars.len();
    // closer + the mandatory character before it
    if caret.offset < mlen + 1 {
        return false;
    }
    let Some(parent) = doc.element_at(&caret.parent) else {
        return false;
    };
    let (index, inner) = parent.child_at_offset(caret.offset);
    let (run_index, caret_in_run) = if inner > 0 {
        (index, inner)
    } else if index > 0 {
        match parent.children[index - 1].as_text() {
            Some(run) => (index - 1, run.char_len()),
            None => return false,
        }
    } else {
        return false;
    };
    let Some(run) = parent.children[run_index].as_text() else {
        return false;
    };
    let run_start = parent.offset_of_child(run_index);
    let chars: Vec<char> = run.data.chars().collect();

    if caret_in_run < mlen {
        return false;
    }
    let closer_start = caret_in_run - mlen;
    if chars[closer_start..caret_in_run] != mchars[..] {
        return false;
    }
    let before_closer = if closer_start > 0 {
        Some(chars[closer_start - 1])
    } else {
        prev_sibling_last_char(parent, run_index)
    };
    match before_closer {
        Some(c) if !c.is_whitespace() && c != mchars[0] => {}
        _ => return false,
    }
    if let Some(c) = char_at(parent, caret.offset) {
        // anything that isn't a word character counts as punctuation,
        // Unicode included
        if c.is_alphanumeric() {
            return false;
        }
    }

    // opener + at least one character of content before the closer
    if closer_start < mlen + 1 {
        return false;
    }
    let mut opener = None;
    for p in (0..=closer_start - mlen - 1).rev() {
        if chars[p..p + mlen] != mchars[..] {
            continue;
        }
        let after = chars[p + mlen];
        if after.is_whitespace() || after == mchars[0] {
            continue;
        }
        let before = if p > 0 {
            Some(chars[p - 1])
        } else if run_index == 0 {
            None
        } else {
            prev_sibling_last_char(parent, run_index)
        };
        let valid = match before {
            None => true, // block start
            Some(c) => c.is_whitespace() || OPENING_PUNCT.contains(&c),
        };
        if valid {
            opener = Some(p);
            break;
        }
    }
    let Some(opener_in_run) = opener else {
        return false;
    };

    let Some(cmd) = doc.commands().get(command) else {
        return false;
    };
    if !cmd.is_enabled(doc) {
        trace!(command, "marker matched but command is disabled");
        return false;
    }

    let opener_start = run_start + opener_in_run;
    let closer_abs = run_start + closer_start;
    let span_end = closer_abs - mlen;
    let parent_path = caret.parent.clone();
    let caret_attrs = doc.selection().attributes.clone();
    debug!(marker, command, "converting inline marker");
    doc.change(|w| {
        w.remove_range(&Range::flat(parent_path.clone(), closer_abs, mlen));
        w.remove_range(&Range::flat(parent_path.clone(), opener_start, mlen));
        w.set_selection(Selection::ranged(
            Position::new(parent_path.clone(), opener_start),
            Position::new(parent_path.clone(), span_end),
            caret_attrs.clone(),
        ));
        cmd.execute(w, params);
        w.set_selection(Selection::collapsed(
            Position::new(parent_path.clone(), span_end),
            caret_attrs.clone(),
        ));
    });
    true
}

/// Try one block marker: the caret must sit right after the whole
/// prefix at the start of an unformatted paragraph.
fn try_block(
    doc: &mut Document,
    caret: &Position,
    prefix: &str,
    pattern: &Regex,
    command: &str,
    params: &CommandParams,
) -> bool {
    let plen = prefix.chars().count();
    if caret.offset != plen {
        return false;
    }
    let Some(block) = doc.element_at(&caret.parent) else {
        return false;
    };
    if block.name != "paragraph" || !block.attributes.is_empty() {
        return false;
    }
    if !pattern.is_match(&block.leading_text()) {
        return false;
    }
    let Some(cmd) = doc.commands().get(command) else {
        return false;
    };
    if !cmd.is_enabled(doc) {
        trace!(command, "marker matched but command is disabled");
        return false;
    }

    let parent_path = caret.parent.clone();
    let caret_attrs = doc.selection().attributes.clone();
    debug!(prefix, command, "converting block marker");
    doc.change(|w| {
        w.remove_range(&Range::flat(parent_path.clone(), 0, plen));
        w.set_selection(Selection::collapsed(
            Position::new(parent_path.clone(), 0),
            caret_attrs,
        ));
        cmd.execute(w, params);
    });
    true
}

/// Character right before the first child of `run_index`, when the
/// previous sibling is a text run. Elements and block starts yield
/// `None`.
fn prev_sibling_last_char(parent: &Element, run_index: usize) -> Option<char> {
    if run_index == 0 {
        return None;
    }
    parent.children[run_index - 1]
        .as_text()
        .and_then(|run| run.data.chars().last())
}

/// Character at a block offset, `None` at the end of the block or when
/// the offset lands on an element child.
fn char_at(parent: &Element, offset: usize) -> Option<char> {
    let mut rem = offset;
    for child in &parent.children {
        let size = child.offset_size();
        if rem < size {
            return child.as_text().and_then(|run| run.data.chars().nth(rem));
        }
        rem -= size;
    }
    None
}

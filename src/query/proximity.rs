//! Proximity operators.
//!
//! `#NEAR/n` and `#WINDOW/n` are evaluated eagerly: when the query is
//! initialized, the argument posting sources are merged into a new inverted
//! list whose positions are the right-most position of every matched window.
//! The synthesized list then behaves like any other posting source, so
//! proximity operators nest freely.
//!
//! Within a document each argument position is consumed by at most one
//! recorded window. Comparisons are streamed through borrowed
//! [`LocationCursor`]s; nothing but the match positions is copied.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProximaError, Result};
use crate::posting::{InvertedList, Position};
use crate::query::iterator::{DocIterator, LocationCursor, synchronize_all};
use crate::query::source::PostingSource;

/// The two proximity operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProximityKind {
    /// Arguments appear in order, first to last within `n` positions.
    Near,
    /// Arguments appear in any order inside a window narrower than `n`.
    Window,
}

impl ProximityKind {
    /// Query-language name of the operator.
    pub fn name(&self) -> &'static str {
        match self {
            ProximityKind::Near => "#NEAR",
            ProximityKind::Window => "#WINDOW",
        }
    }
}

impl fmt::Display for ProximityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Evaluate a proximity operator over its argument sources.
///
/// All arguments must share one field. With no arguments the result is an
/// empty list.
pub fn evaluate(
    kind: ProximityKind,
    span: u32,
    mut sources: Vec<PostingSource>,
) -> Result<InvertedList> {
    if span == 0 {
        return Err(ProximaError::config(format!("{kind}/0 is not a valid span")));
    }

    // Zero-argument operators produce a list without a field.
    let field = sources
        .iter()
        .map(PostingSource::field)
        .find(|field| !field.is_empty())
        .unwrap_or_default()
        .to_string();
    if let Some(other) = sources
        .iter()
        .find(|source| !source.field().is_empty() && source.field() != field)
    {
        return Err(ProximaError::config(format!(
            "{kind}/{span} arguments must share a field, found {} and {}",
            field,
            other.field()
        )));
    }

    let mut list = InvertedList::new(field);
    while let Some(doc_id) = synchronize_all(&mut sources) {
        let positions = {
            let mut cursors: Vec<LocationCursor<'_>> =
                sources.iter().map(PostingSource::location_cursor).collect();
            match kind {
                ProximityKind::Near => near_matches(&mut cursors, span),
                ProximityKind::Window => window_matches(&mut cursors, span),
            }
        };

        if !positions.is_empty() {
            list.append_positions(doc_id, positions)?;
        }
        for source in sources.iter_mut() {
            source.advance_past(doc_id);
        }
    }

    tracing::debug!(
        operator = %kind,
        span,
        df = list.df(),
        ctf = list.ctf(),
        "evaluated proximity operator"
    );
    Ok(list)
}

/// Ordered matches within one document.
///
/// Returns the right-most position of each window in which the arguments
/// occur in order and `last - first <= span`.
pub(crate) fn near_matches(cursors: &mut [LocationCursor<'_>], span: u32) -> Vec<Position> {
    let mut matches = Vec::new();

    while let Some((first, last)) = order_locations(cursors) {
        if last - first <= span {
            matches.push(last);
            cursors.iter_mut().for_each(LocationCursor::advance);
        } else {
            cursors[0].advance();
        }
    }

    matches
}

/// Push every cursor past its predecessor.
///
/// Returns the first and last position of the ordered vector, or `None` once
/// any cursor runs out.
fn order_locations(cursors: &mut [LocationCursor<'_>]) -> Option<(Position, Position)> {
    let first = cursors.first()?.current()?;
    let mut previous = first;
    for cursor in cursors.iter_mut().skip(1) {
        cursor.advance_past(previous);
        previous = cursor.current()?;
    }
    Some((first, previous))
}

/// Unordered matches within one document.
///
/// Returns the maximum position of each window with `max - min < span`.
pub(crate) fn window_matches(cursors: &mut [LocationCursor<'_>], span: u32) -> Vec<Position> {
    let mut matches = Vec::new();

    'windows: loop {
        let mut heap = BinaryHeap::with_capacity(cursors.len());
        let mut max = 0;
        for (slot, cursor) in cursors.iter().enumerate() {
            let Some(position) = cursor.current() else {
                break 'windows;
            };
            max = max.max(position);
            heap.push(Reverse((position, slot)));
        }

        while let Some(&Reverse((min, slot))) = heap.peek() {
            if max - min < span {
                matches.push(max);
                cursors.iter_mut().for_each(LocationCursor::advance);
                continue 'windows;
            }

            heap.pop();
            cursors[slot].advance();
            let Some(position) = cursors[slot].current() else {
                break 'windows;
            };
            max = max.max(position);
            heap.push(Reverse((position, slot)));
        }

        // Only reachable without arguments.
        break;
    }

    matches
}

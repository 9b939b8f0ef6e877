use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::num_field;

/// Normalized positional reference attached to a chunk for citation display.
///
/// At most one variant applies per record; `anchor_for` enforces the
/// selection priority in one place.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TimeRange { start_sec: f64, end_sec: f64 },
    Page(i64),
    Slide(i64),
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::TimeRange { start_sec, end_sec } => {
                let (sm, ss) = minutes_seconds(*start_sec);
                let (em, es) = minutes_seconds(*end_sec);
                write!(f, "[{sm}:{ss:02}-{em}:{es:02}]")
            }
            Anchor::Page(n) => write!(f, "[Page {n}]"),
            Anchor::Slide(n) => write!(f, "[Slide {n}]"),
        }
    }
}

/// Fractional seconds truncate (never round); minutes are unbounded and not
/// zero-padded.
fn minutes_seconds(sec: f64) -> (i64, i64) {
    let total = sec.floor() as i64;
    (total / 60, total.rem_euclid(60))
}

/// Derive the anchor for a chunk's metadata, checking the closed schema set
/// in fixed priority: time range, then page, then slide.
///
/// A half time-range pair or a non-numeric value in a recognized field is
/// treated as "no anchor" and falls through; this never raises.
pub fn anchor_for(metadata: &BTreeMap<String, Value>) -> Option<Anchor> {
    let start_sec = num_field(metadata, "start_sec");
    let end_sec = num_field(metadata, "end_sec");
    let page = num_field(metadata, "page");
    let slide = num_field(metadata, "slide");

    match (start_sec, end_sec, page, slide) {
        (Some(start_sec), Some(end_sec), _, _) => Some(Anchor::TimeRange { start_sec, end_sec }),
        (_, _, Some(page), _) => Some(Anchor::Page(page.trunc() as i64)),
        (_, _, _, Some(slide)) => Some(Anchor::Slide(slide.trunc() as i64)),
        _ => None,
    }
}

/// Display form of the derived anchor, or the empty string when none applies.
pub fn format_anchor(metadata: &BTreeMap<String, Value>) -> String {
    anchor_for(metadata)
        .map(|a| a.to_string())
        .unwrap_or_default()
}

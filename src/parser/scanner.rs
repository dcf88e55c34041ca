//! Name scanner for static export listings.
//!
//! This is a best-effort heuristic, not a parser: every line is tried as a
//! `-- name:` header on its own and lines that fail are skipped, including
//! malformed headers. SQL body lines can therefore be anything at all.
//! [`parse_all`](super::parse_all) is authoritative and should be preferred
//! whenever the full parse is affordable.

use super::grammar;
use crate::ident::to_ident;
use crate::query::CallSpec;

/// Collect the call spec of every header line in `text`.
pub fn scan_names(text: &str) -> Vec<CallSpec> {
    text.lines()
        .enumerate()
        .filter_map(|(index, line)| {
            let spec = scan_line(line);
            if spec.is_none() && line.trim_start().starts_with("--") {
                tracing::trace!("Line {} is not a query header, skipped", index + 1);
            }
            spec
        })
        .collect()
}

fn scan_line(line: &str) -> Option<CallSpec> {
    let line = format!("{}\n", line);
    let (_, header) = grammar::header(&line).ok()?;
    let id = to_ident(header.name)?;
    Some(CallSpec::new(id, header.annotation))
}

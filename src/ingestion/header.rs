//! Header-row normalization shared by the CSV and Excel readers.

use std::collections::HashSet;

/// Turn raw header cells into unique, non-empty column names.
///
/// Cells are trimmed; a blank cell at position `i` becomes `column_{i+1}`; a repeated name gets
/// the first free `_2`, `_3`, ... suffix.
pub(crate) fn normalize_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for (idx, cell) in raw.into_iter().enumerate() {
        let trimmed = cell.as_ref().trim();
        let base = if trimmed.is_empty() {
            format!("column_{}", idx + 1)
        } else {
            trimmed.to_owned()
        };

        let mut name = base.clone();
        let mut n = 2;
        while seen.contains(&name) {
            name = format!("{base}_{n}");
            n += 1;
        }
        seen.insert(name.clone());
        out.push(name);
    }

    out
}

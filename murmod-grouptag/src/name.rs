// SPDX-License-Identifier: MIT OR Apache-2.0

/// Strips a previously appended tag suffix from a display name.
///
/// A `[` after the first character marks the start of the suffix; everything
/// from one character before it (the separator space of an earlier rewrite)
/// onwards is dropped. A name without a bracket, or with one in leading
/// position, is returned unchanged. Names that legitimately contain `[` are
/// indistinguishable from tagged ones, a known limitation of the format.
pub(crate) fn base_name(current: &str) -> &str {
    let Some(bracket) = current.find('[') else {
        return current;
    };
    if bracket == 0 {
        return current;
    }
    // drop exactly one character before the bracket, without assuming it is
    // one byte wide
    let head = &current[..bracket];
    let cut = head.char_indices().last().map(|(index, _)| index).unwrap_or(0);
    &current[..cut]
}

/// Computes the display name carrying the given tags.
///
/// Any existing tag suffix is stripped first, which makes the function
/// idempotent: applying it twice with the same tags yields the same name.
pub fn rewrite_name(current: &str, tags: &[String]) -> String {
    let base = base_name(current);
    if tags.is_empty() {
        base.to_string()
    } else {
        format!("{} [ {} ]", base, tags.join(", "))
    }
}

pub const ELLIPSIS: &str = "...";

/// Caps `text` at `max_chars` characters, appending `marker` only when something was cut.
pub fn truncate_chars(text: &str, max_chars: usize, marker: &str) -> String {
	match text.char_indices().nth(max_chars) {
		Some((byte_idx, _)) => {
			let mut out = String::with_capacity(byte_idx + marker.len());

			out.push_str(&text[..byte_idx]);
			out.push_str(marker);

			out
		},
		None => text.to_string(),
	}
}

/// Trims whitespace and removes one layer of matching `"` or `'` around the whole text.
pub fn strip_enclosing_quotes(text: &str) -> &str {
	let trimmed = text.trim();

	for quote in ['"', '\''] {
		if trimmed.len() >= 2
			&& let Some(inner) =
				trimmed.strip_prefix(quote).and_then(|rest| rest.strip_suffix(quote))
		{
			return inner.trim();
		}
	}

	trimmed
}

pub fn char_len(text: &str) -> usize {
	text.chars().count()
}

//! Dot-notation path access over untyped JSON.
//!
//! Salt API responses are deeply nested and heterogeneously typed; call
//! sites navigate them with paths like `"return[0].jid"` and turn a miss
//! into a classified shape error instead of faulting mid-chain.

use serde_json::Value;

/// Get a value from JSON using a dot-notation path with array indexing
/// (e.g. `"return[0].jid"`, `"info[0].Result"`).
pub(crate) fn get_path<'a>(obj: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = obj;

    for part in path.split('.') {
        if part.is_empty() {
            return None;
        }

        if let Some(bracket_pos) = part.find('[') {
            let key = &part[..bracket_pos];
            let idx_str = part[bracket_pos + 1..].trim_end_matches(']');

            if !key.is_empty() {
                current = current.as_object()?.get(key)?;
            }
            let idx: usize = idx_str.parse().ok()?;
            current = current.as_array()?.get(idx)?;
        } else {
            current = current.as_object()?.get(part)?;
        }
    }

    Some(current)
}

//! String normalization rules for silver cleaning.

use arrow::array::StringArray;

/// Strip every non-ASCII-alphanumeric character and uppercase the rest.
///
/// `"cust_003"` becomes `"CUST003"`, `"CUST-002"` becomes `"CUST002"`.
pub fn normalize_customer_id(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Title-case a string: the first letter of every word upper, the rest lower.
///
/// A word is a run of cased characters, so digits, whitespace, punctuation
/// and letters without case (CJK, for one) all act as separators
/// (`"o'neil"` becomes `"O'Neil"`, `"2nd floor"` becomes `"2Nd Floor"`,
/// `"中a"` becomes `"中A"`).
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_word = false;
    for ch in raw.chars() {
        if is_cased(ch) {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

/// Upper, lower or title case (`ǅ` has distinct upper and lower forms).
fn is_cased(ch: char) -> bool {
    ch.is_uppercase() || ch.is_lowercase() || ch.to_uppercase().ne(ch.to_lowercase())
}

/// Lowercase a status value.
pub fn normalize_status(raw: &str) -> String {
    raw.to_lowercase()
}

/// Apply `f` to every non-null value, keeping nulls in place.
pub(crate) fn map_strings(array: &StringArray, f: impl Fn(&str) -> String) -> StringArray {
    array.iter().map(|v| v.map(&f)).collect()
}

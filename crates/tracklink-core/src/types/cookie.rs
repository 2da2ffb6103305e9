//! Cookie header construction.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters escaped by `encodeURIComponent`: everything except
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Builds a `Cookie` header value from name/value pairs.
///
/// Values are percent-encoded, names are used verbatim, and pairs are
/// joined with `"; "` in iteration order.
pub fn build_cookie_header<I, K, V>(cookies: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    cookies
        .into_iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                name.as_ref(),
                utf8_percent_encode(value.as_ref(), COMPONENT)
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

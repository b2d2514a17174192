//! Boundary generation and validation (RFC 2046 section 5.1.1).

use rand::distr::{Alphanumeric, Distribution};

use crate::{Error, Result};

/// Longest boundary RFC 2046 allows.
pub(crate) const MAX_LEN: usize = 70;

/// Random characters per generated boundary (62 symbols, ~190 bits).
const RANDOM_LEN: usize = 32;

const PREFIX: &str = "----partwise-";

/// Generate a random boundary.
pub(crate) fn generate() -> String {
    let mut rng = rand::rng();
    let token: String = Alphanumeric
        .sample_iter(&mut rng)
        .take(RANDOM_LEN)
        .map(char::from)
        .collect();

    format!("{PREFIX}{token}")
}

/// Check a caller-supplied boundary against the RFC 2046 grammar.
pub(crate) fn validate(boundary: &str) -> Result<()> {
    if boundary.is_empty() || boundary.len() > MAX_LEN {
        return Err(Error::invalid_boundary(format!(
            "length must be between 1 and {MAX_LEN}, got {}",
            boundary.len()
        )));
    }
    if let Some(c) = boundary.chars().find(|c| !is_bchar(*c)) {
        return Err(Error::invalid_boundary(format!(
            "character {c:?} is not allowed"
        )));
    }
    if boundary.ends_with(' ') {
        return Err(Error::invalid_boundary("must not end with a space"));
    }
    Ok(())
}

/// Returns `true` if `boundary` occurs anywhere inside `content`.
pub(crate) fn occurs_in(boundary: &str, content: &[u8]) -> bool {
    let needle = boundary.as_bytes();
    !needle.is_empty() && content.windows(needle.len()).any(|window| window == needle)
}

/// Returns `true` if the boundary must be a quoted-string in the
/// `Content-Type` parameter (RFC 2045 `token` excludes space and tspecials).
pub(crate) fn needs_quoting(boundary: &str) -> bool {
    boundary.chars().any(|c| "()<>@,;:\\\"/[]?= ".contains(c))
}

fn is_bchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || "'()+_,-./:=? ".contains(c)
}

//! Accept-Encoding parsing and encoding selection

use crate::compressor::Encoding;

/// Iterate the codings a client lists, in the order it listed them
///
/// Parameters are dropped and names lowercased. Codings the client explicitly
/// refuses with `q=0` are skipped.
fn accepted_codings(accept_encoding: &str) -> impl Iterator<Item = String> + '_ {
    accept_encoding.split(',').filter_map(|item| {
        let mut parts = item.split(';');
        let coding = parts.next()?.trim();
        if coding.is_empty() {
            return None;
        }

        let refused = parts.any(|param| {
            param
                .split_once('=')
                .filter(|(name, _)| name.trim().eq_ignore_ascii_case("q"))
                .and_then(|(_, q)| q.trim().parse::<f32>().ok())
                .is_some_and(|q| q <= 0.0)
        });
        if refused {
            return None;
        }

        Some(coding.to_ascii_lowercase())
    })
}

/// Whether the client lists any coding this pipeline can produce
pub fn accepts_compression(accept_encoding: &str) -> bool {
    select_encoding(accept_encoding).is_some()
}

/// Pick the first supported coding in client order
///
/// The client's ordering is authoritative; unknown codings are skipped.
pub fn select_encoding(accept_encoding: &str) -> Option<Encoding> {
    accepted_codings(accept_encoding).find_map(|coding| Encoding::from_token(&coding))
}

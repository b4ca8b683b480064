//! Authorize and logout URIs for the redirect flow.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use super::options::ResolvedOptions;

// Unreserved characters stay readable in query values.
const QUERY_VALUE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE_SET).to_string()
}

fn query(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub(crate) fn login_uri(options: &ResolvedOptions, nonce: &str, silent: bool) -> String {
    let mut params = vec![
        ("client_id", options.client_id.as_str()),
        ("response_type", "id_token"),
        ("redirect_uri", options.redirect_uri.as_str()),
        ("nonce", nonce),
    ];
    // Without a provider session this fails instead of prompting.
    if silent {
        params.push(("prompt", "none"));
    }
    format!(
        "{}/{}/oauth2/authorize?{}",
        options.authority,
        encode(&options.tenant),
        query(&params)
    )
}

pub(crate) fn logout_uri(options: &ResolvedOptions) -> String {
    format!(
        "{}/{}/oauth2/logout?{}",
        options.authority,
        encode(&options.tenant),
        query(&[("post_logout_redirect_uri", options.redirect_uri.as_str())])
    )
}

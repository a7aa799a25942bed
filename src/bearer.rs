/// Extract the credential from an `Authorization` header value of the form
/// `Bearer <token>`. The scheme is matched case-insensitively.
pub(crate) fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim_start();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }

    Some(token)
}

//! Base URI resolution.

use url::Url;

use crate::error::{ODataError, ODataResult};

/// Resolve `href` against `base`.
///
/// Absolute hrefs are returned as-is. Relative hrefs are resolved with
/// RFC 3986 reference resolution, so `./p2` against `http://h/svc/Set`
/// yields `http://h/svc/p2`. A relative href without a base fails with
/// `UnresolvableBase`.
pub fn resolve(base: Option<&Url>, href: &str) -> ODataResult<Url> {
    match Url::parse(href) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => Ok(base.join(href)?),
            None => Err(ODataError::UnresolvableBase(href.to_string())),
        },
        Err(e) => Err(ODataError::InvalidUri(e)),
    }
}

/// Parse an optional base URI declared by a resource.
pub fn parse_base(base: Option<&str>) -> ODataResult<Option<Url>> {
    base.map(|b| Url::parse(b.trim()).map_err(ODataError::from))
        .transpose()
}

/// Service root derived from a context URL: everything before `$metadata`.
pub fn base_of_context(context: &str) -> Option<Url> {
    let idx = context.find("$metadata")?;
    Url::parse(&context[..idx]).ok()
}

/// Last path segment of a context URL fragment, e.g. `Name` in
/// `http://h/svc/$metadata#Customers(1)/Name`.
pub fn context_fragment_tail(context: &str) -> Option<&str> {
    let (_, fragment) = context.split_once('#')?;
    let tail = fragment.rsplit('/').next()?;
    if tail.is_empty() {
        None
    } else {
        Some(tail)
    }
}

//! Content negotiation: response representation and locale.
//!
//! Both are derived from request headers and live only as long as the
//! request. Nothing here touches shared state.

use crate::request::Request;

/// Wire format of a response body.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Representation {
    Json,
    Xml,
}

/// What the negotiator settled on for one request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Negotiation {
    pub representation: Representation,
    pub locale: String,
}

/// `Accept` named no representation brains can produce.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("no acceptable representation")]
pub struct NotAcceptable;

/// Picks representation and locale from `Accept` and `Accept-Language`.
#[derive(Clone, Debug)]
pub struct Negotiator {
    default_locale: String,
}

impl Negotiator {
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self { default_locale: default_locale.into() }
    }

    pub fn default_locale(&self) -> &str { &self.default_locale }

    pub fn negotiate(&self, req: &Request) -> Result<Negotiation, NotAcceptable> {
        Ok(Negotiation {
            representation: self.representation(req)?,
            locale: self.locale(req),
        })
    }

    /// A missing or blank `Accept` means JSON. Otherwise media ranges are
    /// tried by descending `q` (ties in header order) and the first supported
    /// one wins. Ranges with `q=0` are refusals and never selected.
    pub fn representation(&self, req: &Request) -> Result<Representation, NotAcceptable> {
        let accept = match req.header_list("accept") {
            Some(accept) if !accept.trim().is_empty() => accept,
            _ => return Ok(Representation::Json),
        };

        let mut ranges: Vec<(String, f32)> = accept
            .split(',')
            .filter_map(parse_media_range)
            .filter(|(_, q)| *q > 0.0)
            .collect();
        // `sort_by` is stable, so equal weights keep header order.
        ranges.sort_by(|a, b| b.1.total_cmp(&a.1));

        ranges
            .iter()
            .find_map(|(media, _)| supported(media))
            .ok_or(NotAcceptable)
    }

    /// `Accept-Language`, verbatim, or the configured default.
    pub fn locale(&self, req: &Request) -> String {
        match req.header("accept-language").map(str::trim) {
            Some(lang) if !lang.is_empty() => lang.to_owned(),
            _ => self.default_locale.clone(),
        }
    }
}

/// `"application/xml;q=0.5"` → `("application/xml", 0.5)`. Malformed weights
/// count as 1 so a typo never hides an otherwise acceptable type.
fn parse_media_range(range: &str) -> Option<(String, f32)> {
    let mut parts = range.split(';');
    let media = parts.next()?.trim().to_ascii_lowercase();
    if media.is_empty() {
        return None;
    }
    let q = parts
        .filter_map(|p| p.trim().strip_prefix("q="))
        .find_map(|q| q.trim().parse::<f32>().ok())
        .unwrap_or(1.0);
    Some((media, q))
}

fn supported(media: &str) -> Option<Representation> {
    match media {
        "application/json" | "application/*" | "*/*" => Some(Representation::Json),
        "application/xml" | "text/xml" => Some(Representation::Xml),
        m if m.starts_with("application/") && m.ends_with("+json") => Some(Representation::Json),
        m if m.ends_with("+xml") => Some(Representation::Xml),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;

    fn with(headers: &[(&str, &str)]) -> Request {
        headers
            .iter()
            .fold(Request::builder(Method::Get, "/humans"), |b, (k, v)| b.header(k, v))
            .build()
    }

    fn pick(accept: &str) -> Result<Representation, NotAcceptable> {
        Negotiator::new("en").representation(&with(&[("accept", accept)]))
    }

    #[test]
    fn missing_accept_means_json() {
        let n = Negotiator::new("en");
        assert_eq!(n.representation(&with(&[])), Ok(Representation::Json));
        assert_eq!(pick("  "), Ok(Representation::Json));
    }

    #[test]
    fn picks_json_and_xml() {
        assert_eq!(pick("application/json"), Ok(Representation::Json));
        assert_eq!(pick("application/xml"), Ok(Representation::Xml));
        assert_eq!(pick("text/xml"), Ok(Representation::Xml));
        assert_eq!(pick("*/*"), Ok(Representation::Json));
    }

    #[test]
    fn vendor_media_type_is_json() {
        assert_eq!(pick("application/vnd.zombies.v1+json"), Ok(Representation::Json));
    }

    #[test]
    fn unsupported_is_not_acceptable() {
        assert_eq!(pick("text/html"), Err(NotAcceptable));
        assert_eq!(pick("image/png, text/csv"), Err(NotAcceptable));
        assert_eq!(pick("application/json;q=0"), Err(NotAcceptable));
    }

    #[test]
    fn honours_quality_weights() {
        assert_eq!(pick("application/json;q=0.4, application/xml"), Ok(Representation::Xml));
        assert_eq!(pick("text/html, application/xml;q=0.9, */*;q=0.1"), Ok(Representation::Xml));
        assert_eq!(pick("application/xml, application/json"), Ok(Representation::Xml));
    }

    #[test]
    fn accept_split_across_lines_is_one_list() {
        let req = with(&[("accept", "text/html"), ("accept", "application/xml")]);
        assert_eq!(Negotiator::new("en").representation(&req), Ok(Representation::Xml));
    }

    #[test]
    fn locale_is_verbatim_or_default() {
        let n = Negotiator::new("en");
        assert_eq!(n.locale(&with(&[("accept-language", "pt-BR")])), "pt-BR");
        assert_eq!(n.locale(&with(&[("accept-language", "")])), "en");
        assert_eq!(n.locale(&with(&[])), "en");
    }

    #[test]
    fn negotiate_combines_both() {
        let n = Negotiator::new("en");
        let req = with(&[("accept", "application/xml"), ("accept-language", "es")]);
        assert_eq!(
            n.negotiate(&req),
            Ok(Negotiation { representation: Representation::Xml, locale: "es".into() }),
        );
    }
}

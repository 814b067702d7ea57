//! URL permissibility: decides which tabs may be archived and later reopened.

/// Predicate supplied by the host. Any `Fn(&str) -> bool` qualifies.
pub trait UrlPolicy: Send + Sync {
    fn is_permissible(&self, url: &str) -> bool;
}

impl<F> UrlPolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_permissible(&self, url: &str) -> bool { self(url) }
}

pub const DEFAULT_BLOCKED_SCHEMES: [&str; 3] = ["about", "chrome", "moz-extension"];

/// Rejects URLs whose scheme cannot be reopened by an extension.
///
/// A string without a valid scheme is never permissible.
#[derive(Debug, Clone)]
pub struct SchemePolicy {
    blocked: Vec<String>,
}

impl SchemePolicy {
    pub fn new<I, S>(blocked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { blocked: blocked.into_iter().map(|s| s.as_ref().to_ascii_lowercase()).collect() }
    }
}

impl Default for SchemePolicy {
    fn default() -> Self { Self::new(DEFAULT_BLOCKED_SCHEMES) }
}

impl UrlPolicy for SchemePolicy {
    fn is_permissible(&self, url: &str) -> bool {
        match scheme_of(url) {
            Some(scheme) => !self.blocked.iter().any(|b| b.eq_ignore_ascii_case(scheme)),
            None => false,
        }
    }
}

/// RFC 3986 scheme: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) followed by ':'.
fn scheme_of(url: &str) -> Option<&str> {
    let (scheme, _) = url.trim_start().split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some(scheme)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_blocks_internal_pages() {
        let p = SchemePolicy::default();
        assert!(p.is_permissible("https://example.com/a"));
        assert!(p.is_permissible("http://localhost:8080"));
        assert!(p.is_permissible("file:///tmp/x.html"));
        assert!(!p.is_permissible("about:blank"));
        assert!(!p.is_permissible("ABOUT:config"));
        assert!(!p.is_permissible("chrome://browser/content/browser.xhtml"));
        assert!(!p.is_permissible("moz-extension://abc/popup.html"));
    }

    #[test]
    fn unparseable_urls_are_rejected() {
        let p = SchemePolicy::default();
        assert!(!p.is_permissible(""));
        assert!(!p.is_permissible("example.com"));
        assert!(!p.is_permissible("1http://x"));
    }

    #[test]
    fn closures_are_policies() {
        let p = |url: &str| url != "about:blank";
        assert!(p.is_permissible("about:newtab"));
        assert!(!p.is_permissible("about:blank"));
    }
}

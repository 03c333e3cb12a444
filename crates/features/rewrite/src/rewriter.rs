//! The rewrite engine.
//!
//! Archived HTML still points at the live site. The engine rewrites any link
//! to an archived domain so it stays inside the mirror: domains served by
//! this instance become root-relative mirror paths (`/<domain>/…`), domains
//! hosted by the canonical public mirror become absolute URLs on it, and
//! anything else under the archived suffix falls back to the local form.
//!
//! Bodies are handled as raw bytes; captures are not guaranteed valid UTF-8.

use crate::error::RewriteError;
use regex::bytes::{Captures, NoExpand, Regex};
use wm_domain::config::RewriteConfig;

#[derive(Debug)]
pub struct Rewriter {
    local_domains: Vec<Vec<u8>>,
    primary_host: Vec<u8>,
    primary_domains: Vec<Vec<u8>>,
    /// `.`-prefixed suffix, used to spot already-rewritten mirror paths.
    dot_suffix: Vec<u8>,
    aliases: Vec<(Regex, Vec<u8>)>,
    attr_absolute: Regex,
    raw_url: Regex,
    attr_relative: Regex,
    js_property: Regex,
    localhost: Regex,
    request_domain: Regex,
}

impl Rewriter {
    /// Compiles the rule set for the configured archived suffix.
    ///
    /// # Errors
    /// Returns [`RewriteError::Pattern`] if a pattern fails to compile.
    pub fn new(config: &RewriteConfig) -> Result<Self, RewriteError> {
        let suffix = regex::escape(&config.domain_suffix);
        // Match any *.<suffix> domain
        let domain = format!(r"([a-zA-Z0-9.-]+\.{suffix})");

        let aliases = config
            .aliases
            .iter()
            .map(|(broken, canonical)| {
                Ok((Regex::new(&regex::escape(broken))?, canonical.clone().into_bytes()))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            local_domains: config.local_domains.iter().map(|d| d.clone().into_bytes()).collect(),
            primary_host: config.primary_host.clone().into_bytes(),
            primary_domains: config
                .primary_domains
                .iter()
                .map(|d| d.clone().into_bytes())
                .collect(),
            dot_suffix: format!(".{}", config.domain_suffix).into_bytes(),
            aliases,
            attr_absolute: Regex::new(&format!(
                r#"(href|src|srcset)=(["'])https://{domain}/"#
            ))?,
            raw_url: Regex::new(&format!(r#"(^|[^"'=/])https://{domain}/"#))?,
            attr_relative: Regex::new(r#"(href|src|srcset)=(["'])/([^/"']*)"#)?,
            js_property: Regex::new(&format!(r#"(:\s*["'])https://{domain}/"#))?,
            localhost: Regex::new(r"https?://localhost:8080/")?,
            request_domain: Regex::new(&format!(r"^/?([a-zA-Z0-9.-]+\.{suffix})\b"))?,
        })
    }

    /// Rewrites every link to an archived domain in `content` so it points
    /// back into the mirror.
    ///
    /// `request_path` is the normalized, scheme-less path of the page being
    /// served; its leading domain (when present) anchors root-relative links
    /// and dev-server leftovers.
    #[must_use]
    pub fn rewrite_html(&self, request_path: &str, content: &[u8]) -> Vec<u8> {
        let current = self.current_domain(request_path);
        let mut body = content.to_vec();

        // Fix known broken capture-time hostnames first.
        for (pattern, canonical) in &self.aliases {
            body = pattern.replace_all(&body, NoExpand(canonical)).into_owned();
        }

        // --- Step 1: Rewrite in href/src/srcset attributes ---
        body = self
            .attr_absolute
            .replace_all(&body, |caps: &Captures<'_>| {
                let mut out = Vec::with_capacity(caps[0].len());
                out.extend_from_slice(&caps[1]);
                out.push(b'=');
                out.extend_from_slice(&caps[2]);
                out.extend_from_slice(&self.domain_target(&caps[3]));
                out
            })
            .into_owned();

        // --- Step 2: Rewrite raw URLs in text or JS ---
        // Skip URLs that a previous step already handled (preceded by a
        // quote, `=`, or `/`).
        body = self
            .raw_url
            .replace_all(&body, |caps: &Captures<'_>| {
                let mut out = Vec::with_capacity(caps[0].len());
                out.extend_from_slice(&caps[1]);
                out.extend_from_slice(&self.domain_target(&caps[2]));
                out
            })
            .into_owned();

        // --- Step 3: Root-relative links inherit the requested domain ---
        // Only when the current domain can be inferred from the request path.
        if let Some(domain) = &current {
            body = self
                .attr_relative
                .replace_all(&body, |caps: &Captures<'_>| {
                    let segment = &caps[3];
                    if segment.ends_with(&self.dot_suffix) {
                        // Already a mirror path.
                        return caps[0].to_vec();
                    }
                    let mut out = Vec::with_capacity(caps[0].len() + domain.len() + 2);
                    out.extend_from_slice(&caps[1]);
                    out.push(b'=');
                    out.extend_from_slice(&caps[2]);
                    out.push(b'/');
                    out.extend_from_slice(domain);
                    out.push(b'/');
                    out.extend_from_slice(segment);
                    out
                })
                .into_owned();
        }

        // --- Step 4: JS-style object properties like "key": "https://…" ---
        body = self
            .js_property
            .replace_all(&body, |caps: &Captures<'_>| {
                let mut out = Vec::with_capacity(caps[0].len());
                out.extend_from_slice(&caps[1]);
                out.extend_from_slice(&self.domain_target(&caps[2]));
                out
            })
            .into_owned();

        // --- Step 5: Rewrite dev-server leftovers to the mirrored domain path ---
        if let Some(domain) = &current {
            let mut target = Vec::with_capacity(domain.len() + 2);
            target.push(b'/');
            target.extend_from_slice(domain);
            target.push(b'/');
            body = self.localhost.replace_all(&body, NoExpand(&target)).into_owned();
        }

        body
    }

    /// Extracts the archived domain the request path starts with, if any.
    fn current_domain(&self, request_path: &str) -> Option<Vec<u8>> {
        self.request_domain
            .captures(request_path.as_bytes())
            .map(|caps| caps[1].to_vec())
    }

    /// Where a link to `domain` should point on the mirror.
    fn domain_target(&self, domain: &[u8]) -> Vec<u8> {
        let is_local = self.local_domains.iter().any(|d| d.as_slice() == domain);
        let is_primary = self.primary_domains.iter().any(|d| d.as_slice() == domain);

        let mut out = Vec::with_capacity(domain.len() + self.primary_host.len() + 10);
        if is_primary && !is_local {
            out.extend_from_slice(b"https://");
            out.extend_from_slice(&self.primary_host);
        }
        out.push(b'/');
        out.extend_from_slice(domain);
        out.push(b'/');
        out
    }
}

use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// What an override entry resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Answer locally with this address.
    Address(Ipv4Addr),
    /// Resolve this other name upstream and answer with its address.
    Redirect(String),
}

impl Target {
    /// Classify a raw hosts file target.
    ///
    /// Anything containing a lowercase ASCII letter is a name to redirect to, everything else
    /// must be an IPv4 literal. Returns `None` for targets that are neither.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if looks_like_domain_name(raw) {
            return Some(Target::Redirect(raw.trim_end_matches('.').to_string()));
        }
        Ipv4Addr::from_str(raw).ok().map(Target::Address)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Address(ip) => write!(f, "{ip}"),
            Target::Redirect(name) => write!(f, "{name}"),
        }
    }
}

fn looks_like_domain_name(s: &str) -> bool {
    s.bytes().any(|b| b.is_ascii_lowercase())
}

/// An immutable snapshot of the override table, along with the hosts file lines it was parsed
/// from.
#[derive(Default, Debug, Clone)]
pub struct OverrideTable {
    entries: HashMap<String, Target>,
    lines: Vec<String>,
}

impl OverrideTable {
    /// Parse hosts file content of the form `domain target`, one entry per line.
    ///
    /// Text after `#` is a comment. Lines that don't split into exactly two fields, or whose
    /// target is neither a name nor an IPv4 address, are logged and skipped. A later line for
    /// the same domain replaces an earlier one.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut table = Self::default();
        for source_line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            table.lines.push(source_line.to_string());

            let line = source_line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [domain, target] = fields.as_slice() else {
                tracing::warn!("suspicious line in hosts file, ignoring: {source_line}");
                continue;
            };
            let Some(target) = Target::parse(target) else {
                tracing::warn!("unusable target in hosts file, ignoring: {source_line}");
                continue;
            };
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            table.entries.insert(domain, target);
        }
        table
    }

    /// Find the override for a lowercase name without trailing dot.
    ///
    /// An exact entry wins. Otherwise wildcards are tried starting one level below `name` and
    /// moving towards the root: for `a.b.c.com` that is `*.b.c.com`, `*.c.com`, then `*.com`.
    /// The first hit is returned, so the most specific wildcard wins, but `name` itself is
    /// never matched by `*.name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Target> {
        if let Some(target) = self.entries.get(name) {
            return Some(target);
        }
        name.match_indices('.')
            .map(|(dot, _)| format!("*{}", &name[dot..]))
            .find_map(|wildcard| self.entries.get(&wildcard))
    }

    /// The non-empty lines of the hosts file, comments and rejected lines included.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for OverrideTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_unstable_by_key(|(domain, _)| domain.as_str());
        let rendered: Vec<String> = entries
            .into_iter()
            .map(|(domain, target)| format!("{domain} -> {target}"))
            .collect();
        write!(f, "{{{}}}", rendered.join(", "))
    }
}

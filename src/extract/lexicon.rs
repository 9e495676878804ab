//! Closed lexicons driving the exact-match extractors.
//!
//! Lexicon hits are authoritative: when the proper-noun pass and a lexicon
//! extractor disagree about the same label, the lexicon wins.

use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;

/// Ticker symbols recognized without a `$` prefix.
const DEFAULT_TICKER_WHITELIST: &[&str] = &[
    "NVDA", "TSLA", "AAPL", "MSFT", "AMZN", "GOOG", "GOOGL", "META", "AMD", "INTC", "NFLX",
    "AVGO", "CRM", "ORCL", "IBM", "TSM", "ARM", "MU", "SMCI", "PLTR", "COIN", "HOOD", "UBER",
    "ABNB", "SHOP", "PYPL", "DIS", "BA", "JPM", "GS", "SPY", "QQQ", "VTI", "VOO", "IWM",
    "BTC", "ETH", "SOL", "ADA", "XRP", "DOGE", "LINK", "AVAX",
];

/// Short uppercase English words and common acronyms that must never be
/// classified as tickers, `$` form or not.
const DEFAULT_TICKER_STOPLIST: &[&str] = &[
    // articles, pronouns, conjunctions, prepositions
    "A", "AN", "THE", "AND", "OR", "BUT", "NOT", "NOR", "FOR", "SO", "YET", "IF", "AS", "AT",
    "BY", "IN", "OF", "ON", "TO", "UP", "OFF", "OUT", "VS", "VIA", "PER", "I", "ME", "MY", "WE",
    "US", "OUR", "YOU", "HE", "SHE", "IT", "ITS", "THEY", "THEM", "WHO", "WHAT", "WHY", "HOW",
    "ALL", "ANY", "FEW", "NEW", "OLD", "BIG", "TOP", "END", "NOW", "ONE", "TWO", "TEN", "GET",
    "GOT", "SET", "RUN", "USE", "DID", "DO", "DONE", "CAN", "MAY", "AM", "IS", "ARE", "WAS", "BE",
    "HAS", "HAD", "NO", "YES", "OK",
    // common acronyms
    "USA", "USD", "EUR", "GBP", "CEO", "CTO", "CFO", "COO", "VP", "HR", "PR", "AI", "ML", "API",
    "CLI", "GUI", "URL", "URI", "HTTP", "HTML", "CSS", "JSON", "XML", "YAML", "TOML", "SQL",
    "CPU", "GPU", "RAM", "SSD", "USB", "PDF", "FAQ", "ASAP", "FYI", "IMO", "TLDR", "ETA", "DIY",
    "EOD", "EOW", "AKA", "TBD", "TBA", "LOL", "OMG", "BTW", "DM", "PM", "PS", "ETC", "MIN",
    "MAX", "AVG", "QA", "QC", "CI", "CD", "OS", "IO", "ID", "UI", "UX", "DB", "DNS", "IP", "TCP",
    "UDP", "SSH", "SSL", "TLS", "FTP", "AWS", "GCP", "TODO", "WIP", "RFC", "MVP", "POC", "KPI",
    "ROI", "YOY", "MOM", "ATH", "IPO", "ETF",
];

/// Tools and technologies matched case-insensitively as whole words.
const DEFAULT_TOOLS: &[&str] = &[
    // container runtimes and orchestration
    "docker", "podman", "containerd", "kubernetes", "k8s", "helm", "nomad",
    // CI and build systems
    "jenkins", "circleci", "buildkite", "bazel", "cargo", "webpack", "vite",
    // forges and hosting
    "github", "gitlab", "bitbucket", "vercel", "netlify", "heroku", "cloudflare",
    // cloud providers
    "aws", "gcp", "azure", "digitalocean", "hetzner",
    // infra tooling
    "terraform", "ansible", "pulumi", "vault", "consul", "nginx", "caddy", "systemd",
    // datastores and messaging
    "postgres", "postgresql", "mysql", "sqlite", "redis", "kafka", "rabbitmq", "mongodb",
    "elasticsearch", "clickhouse",
    // observability
    "grafana", "prometheus", "datadog", "sentry",
    // languages and runtimes
    "rust", "python", "typescript", "javascript", "golang", "node", "deno", "bun", "tokio",
    // daily drivers
    "git", "tmux", "vim", "neovim", "vscode", "obsidian", "notion", "slack", "discord",
    "linux", "ubuntu", "debian", "macos",
];

/// Multi-word project names matched as anchored phrases.
const DEFAULT_PROJECT_PATTERNS: &[&str] = &[
    r"\bAsymmetry Scanner\b",
    r"\bKnowledge Engine\b",
    r"\bMemory City\b",
    r"\bAgent Harness\b",
];

/// Organization names recognized by the proper-noun classifier.
const KNOWN_ORGANIZATIONS: &[&str] = &[
    "anthropic", "openai", "google", "deepmind", "microsoft", "amazon", "apple", "meta",
    "nvidia", "netflix", "tesla", "spacex", "stripe", "shopify", "cloudflare", "databricks",
    "jpmorgan", "blackrock", "vanguard", "fidelity", "coinbase", "binance",
];

/// Suffix words that mark a capitalized span as an organization.
const ORG_SUFFIXES: &[&str] = &[
    "inc", "corp", "corporation", "llc", "ltd", "labs", "lab", "systems", "technologies",
    "software", "foundation", "institute", "university", "bank", "capital", "partners",
    "group", "ventures", "holdings", "co",
];

/// The closed configuration for exact-match extraction.
///
/// The ticker rule carries a documented non-local coupling: a bare uppercase
/// run classifies as a ticker when the *document* contains the `$`-prefixed
/// form anywhere, even in a different paragraph. [`TickerContext`] holds that
/// document-level scan so paragraph extraction stays cheap.
#[derive(Debug)]
pub struct Lexicon {
    ticker_whitelist: HashSet<String>,
    ticker_stoplist: HashSet<String>,
    tool_regex: Regex,
    project_patterns: Vec<Regex>,
    organizations: HashSet<String>,
    org_suffixes: HashSet<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new(&[], &[], &[], &[]).expect("default lexicon patterns are valid")
    }
}

impl Lexicon {
    /// Build a lexicon, extending the defaults with configured additions.
    /// Non-empty `extra_projects` replaces the default pattern set.
    pub fn new(
        extra_whitelist: &[String],
        extra_stoplist: &[String],
        extra_tools: &[String],
        extra_projects: &[String],
    ) -> Result<Self> {
        let mut ticker_whitelist: HashSet<String> = DEFAULT_TICKER_WHITELIST
            .iter()
            .map(|s| s.to_string())
            .collect();
        ticker_whitelist.extend(extra_whitelist.iter().map(|s| s.to_uppercase()));

        let mut ticker_stoplist: HashSet<String> = DEFAULT_TICKER_STOPLIST
            .iter()
            .map(|s| s.to_string())
            .collect();
        ticker_stoplist.extend(extra_stoplist.iter().map(|s| s.to_uppercase()));

        let mut tools: Vec<String> = DEFAULT_TOOLS.iter().map(|s| s.to_string()).collect();
        tools.extend(extra_tools.iter().map(|s| s.to_lowercase()));
        let alternation = tools
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let tool_regex = Regex::new(&format!(r"(?i)\b({alternation})\b"))
            .context("failed to compile tool lexicon")?;

        let project_sources: Vec<&str> = if extra_projects.is_empty() {
            DEFAULT_PROJECT_PATTERNS.to_vec()
        } else {
            extra_projects.iter().map(String::as_str).collect()
        };
        let project_patterns = project_sources
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("bad project pattern: {p}")))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            ticker_whitelist,
            ticker_stoplist,
            tool_regex,
            project_patterns,
            organizations: KNOWN_ORGANIZATIONS.iter().map(|s| s.to_string()).collect(),
            org_suffixes: ORG_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn is_whitelisted_ticker(&self, run: &str) -> bool {
        self.ticker_whitelist.contains(run)
    }

    pub fn is_stoplisted(&self, run: &str) -> bool {
        self.ticker_stoplist.contains(run)
    }

    /// All tool-lexicon matches in `text`, as found (original casing).
    pub fn tool_matches<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.tool_regex.find_iter(text).map(|m| m.as_str()).collect()
    }

    /// All project-pattern matches in `text`.
    pub fn project_matches<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.project_patterns
            .iter()
            .flat_map(|p| p.find_iter(text).map(|m| m.as_str()))
            .collect()
    }

    /// Whether a lower-cased proper-noun span names a known organization.
    pub fn is_known_organization(&self, span_lower: &str) -> bool {
        if self.organizations.contains(span_lower) {
            return true;
        }
        span_lower
            .split_whitespace()
            .next()
            .is_some_and(|first| self.organizations.contains(first))
    }

    /// Whether the first or final word of a span is an organization keyword
    /// ("Initech Labs", "Bank of America").
    pub fn has_org_suffix(&self, span_lower: &str) -> bool {
        let mut words = span_lower.split_whitespace();
        let first = words.next();
        let last = words.last().or(first);
        [first, last]
            .into_iter()
            .flatten()
            .map(|w| w.trim_end_matches('.'))
            .any(|w| self.org_suffixes.contains(w))
    }
}

/// The document-level `$TICKER` scan shared by every paragraph of one
/// extraction pass.
#[derive(Debug, Default)]
pub struct TickerContext {
    dollar_forms: HashSet<String>,
}

impl TickerContext {
    /// Scan a whole document for `$XXX` forms (2 to 5 uppercase letters).
    pub fn scan(content: &str) -> Self {
        use std::sync::LazyLock;
        static DOLLAR_RUN: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\$([A-Z]{2,5})\b").expect("valid regex"));
        let dollar_forms = DOLLAR_RUN
            .captures_iter(content)
            .map(|c| c[1].to_string())
            .collect();
        Self { dollar_forms }
    }

    pub fn has_dollar_form(&self, run: &str) -> bool {
        self.dollar_forms.contains(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_contains_common_tickers() {
        let lexicon = Lexicon::default();
        assert!(lexicon.is_whitelisted_ticker("NVDA"));
        assert!(!lexicon.is_whitelisted_ticker("ZZZZ"));
    }

    #[test]
    fn stoplist_blocks_common_words() {
        let lexicon = Lexicon::default();
        assert!(lexicon.is_stoplisted("THE"));
        assert!(lexicon.is_stoplisted("API"));
        assert!(!lexicon.is_stoplisted("NVDA"));
    }

    #[test]
    fn overrides_extend_the_defaults() {
        let lexicon = Lexicon::new(
            &["zzzz".to_string()],
            &["nvda".to_string()],
            &["ripgrep".to_string()],
            &[],
        )
        .unwrap();
        assert!(lexicon.is_whitelisted_ticker("ZZZZ"));
        // A stoplist entry coexisting with the whitelist: the whitelist check
        // and stop check are independent gates, resolved by the extractor.
        assert!(lexicon.is_stoplisted("NVDA"));
        assert_eq!(lexicon.tool_matches("I use Ripgrep daily"), vec!["Ripgrep"]);
    }

    #[test]
    fn tool_matching_is_case_insensitive_and_bounded() {
        let lexicon = Lexicon::default();
        assert_eq!(
            lexicon.tool_matches("Deployed with Docker and kubernetes"),
            vec!["Docker", "kubernetes"]
        );
        // "dockerfile" must not match "docker"
        assert!(lexicon.tool_matches("edited the dockerfiles").is_empty());
    }

    #[test]
    fn project_patterns_match_phrases() {
        let lexicon = Lexicon::default();
        let hits = lexicon.project_matches("Shipped the Asymmetry Scanner beta");
        assert_eq!(hits, vec!["Asymmetry Scanner"]);
    }

    #[test]
    fn dollar_scan_collects_document_forms() {
        let ctx = TickerContext::scan("bought $NVDA and $SOL\n\nlater sold more");
        assert!(ctx.has_dollar_form("NVDA"));
        assert!(ctx.has_dollar_form("SOL"));
        assert!(!ctx.has_dollar_form("AAPL"));
        // lowercase and over-long runs never register
        let ctx = TickerContext::scan("$nvda $TOOLONGG");
        assert!(!ctx.has_dollar_form("NVDA"));
    }

    #[test]
    fn org_classification_helpers() {
        let lexicon = Lexicon::default();
        assert!(lexicon.is_known_organization("anthropic"));
        assert!(lexicon.is_known_organization("google cloud"));
        assert!(lexicon.has_org_suffix("acme corp"));
        assert!(lexicon.has_org_suffix("initech labs"));
        assert!(lexicon.has_org_suffix("bank of america"));
        assert!(!lexicon.has_org_suffix("john smith"));
    }
}

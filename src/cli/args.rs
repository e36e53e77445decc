use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "numeric-pager",
    version,
    about = "numbered page strip for feed-backed blogs",
    long_about = "numeric-pager renders the numbered page strip for a blog page URL, reading post counts and page cursors from the blog's JSON feed and caching them locally.\n\nExamples:\n  numeric-pager -u https://blog.example.com/ -m 10\n  numeric-pager -u 'https://blog.example.com/search/label/Rust?max-results=5' --check-for-updates\n  numeric-pager -u https://blog.example.com/ -m 10 --interactive-ellipsis --jump 7 --format json\n\nTip: Use --config to persist settings and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "fmt",
        visible_alias = "format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: html or json."
    )]
    pub format: Option<String>,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Input",
        help = "Blog page URL the strip is rendered for."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.numeric-pager/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'a',
        long = "attr",
        visible_alias = "attribute",
        value_name = "KEY=VALUE",
        action = ArgAction::Append,
        help_heading = "Input",
        help = "Pager element attribute override, e.g. data-max-results=8 (repeatable)."
    )]
    pub attributes: Vec<String>,

    #[arg(
        short = 'p',
        long = "pl",
        visible_alias = "pager-link",
        value_name = "HREF",
        action = ArgAction::Append,
        help_heading = "Input",
        help = "Link already present in the pager; its max-results sets the page size (repeatable)."
    )]
    pub pager_links: Vec<String>,

    #[arg(
        short = 'm',
        long = "mr",
        visible_alias = "max-results",
        value_name = "N",
        help_heading = "Paging",
        help = "Posts per page."
    )]
    pub max_results: Option<usize>,

    #[arg(
        short = 'e',
        long = "en",
        visible_alias = "entries",
        value_name = "N",
        help_heading = "Paging",
        help = "Number of entries rendered on the page (used when --max-results is absent)."
    )]
    pub entries: Option<usize>,

    #[arg(
        short = 'n',
        long = "tvn",
        visible_aliases = ["visible", "total-visible-numbers"],
        value_name = "N",
        help_heading = "Paging",
        help = "Page numbers shown around the current page."
    )]
    pub total_visible_numbers: Option<usize>,

    #[arg(
        short = 'l',
        long = "lb",
        visible_alias = "label",
        value_name = "LABEL",
        help_heading = "Paging",
        help = "Label filter (normally read from /search/label/<label>)."
    )]
    pub label: Option<String>,

    #[arg(
        short = 'q',
        long = "qr",
        visible_alias = "query",
        value_name = "QUERY",
        help_heading = "Paging",
        help = "Search query (normally read from ?q=)."
    )]
    pub query: Option<String>,

    #[arg(
        long = "bd",
        visible_alias = "by-date",
        value_name = "BOOL",
        help_heading = "Paging",
        help = "Sort search results by date (true) or relevance (false)."
    )]
    pub by_date: Option<String>,

    #[arg(
        long = "cfu",
        visible_alias = "check-for-updates",
        help_heading = "Paging",
        help = "Check the feed for changes even when cached data exists."
    )]
    pub check_for_updates: bool,

    #[arg(
        long = "ie",
        visible_alias = "interactive-ellipsis",
        help_heading = "Paging",
        help = "Render clickable ellipses that jump across hidden pages."
    )]
    pub interactive_ellipsis: bool,

    #[arg(
        short = 'j',
        long = "jp",
        visible_alias = "jump",
        value_name = "PAGE",
        help_heading = "Paging",
        help = "After loading, re-render around PAGE without fetching (as an ellipsis click would)."
    )]
    pub jump: Option<usize>,

    #[arg(
        long = "cf",
        visible_alias = "cache",
        value_name = "FILE",
        help_heading = "Cache",
        help = "Cache file (defaults to ~/.numeric-pager/cache.json)."
    )]
    pub cache: Option<String>,

    #[arg(
        long = "ncf",
        visible_alias = "no-cache",
        help_heading = "Cache",
        help = "Keep the cache in memory for this run only."
    )]
    pub no_cache: bool,

    #[arg(
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "Network",
        help = "Feed request timeout in seconds."
    )]
    pub timeout: Option<u64>,
}

// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use clap's "derive" API: the struct below *is* the CLI. Every field
// becomes a flag or a positional argument, and the doc comments become the
// --help text.
//
// Most flags map one-to-one onto pathcrawl::Options; into_options() does
// that mapping so main.rs never has to know the field names.
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

use pathcrawl::Options;

#[derive(Parser, Debug)]
#[command(
    name = "pathcrawl",
    version,
    about = "Discover every in-scope URL reachable from a set of seed hosts",
    long_about = "pathcrawl crawls from one or more hosts or URLs, mining links from every \
                  response body and robots.txt. Results are printed as they are found: \
                  one line per request with its status code."
)]
pub struct Cli {
    /// Hosts or URLs to start from (scheme is probed when omitted)
    pub targets: Vec<String>,

    /// Read additional targets from a file, one per line
    #[arg(short = 'i', long)]
    pub infile: Option<PathBuf>,

    /// Host patterns to crawl (example.com, *.example.com, host:port)
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<String>,

    /// Host patterns never to crawl
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Number of concurrent workers (forced to 1 for a single target)
    #[arg(short, long, default_value_t = pathcrawl::options::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Request timeout in seconds
    #[arg(short, long, default_value_t = pathcrawl::options::DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Seconds to wait for response headers (defaults to --timeout)
    #[arg(long)]
    pub response_header_timeout: Option<u64>,

    /// Delay before each request, in milliseconds
    #[arg(short, long, default_value_t = 0)]
    pub delay: u64,

    /// Random extra delay (0..N milliseconds) added to --delay
    #[arg(long, default_value_t = 0)]
    pub delay_jitter: u64,

    /// User-Agent header to send
    #[arg(short = 'a', long)]
    pub user_agent: Option<String>,

    /// Proxy URL (http:// is assumed when no scheme is given)
    #[arg(short, long)]
    pub proxy: Option<String>,

    /// DNS servers to use instead of the system ones (ip or ip:port)
    #[arg(short, long, value_delimiter = ',')]
    pub resolvers: Vec<String>,

    /// Seconds without new work before the crawl stops
    #[arg(long, default_value_t = pathcrawl::options::DEFAULT_IDLE_TIMEOUT_SECS)]
    pub idle_timeout: u64,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// No logging at all
    #[arg(short, long)]
    pub silence: bool,

    /// Output results as JSON lines instead of plain text
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn into_options(self) -> Options {
        let defaults = Options::default();

        Options {
            include: self.include,
            exclude: self.exclude,
            concurrency: self.concurrency,
            timeout: self.timeout,
            // 0 means "same as timeout" after set_defaults_missing()
            response_header_timeout: self.response_header_timeout.unwrap_or(0),
            delay: self.delay,
            delay_jitter: self.delay_jitter,
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            proxy: self.proxy,
            resolvers: self.resolvers,
            verbose: self.verbose,
            silence: self.silence,
            idle_timeout: self.idle_timeout,
            ..defaults
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does value_delimiter = ',' do?
//    - Lets a list flag take comma-separated values
//    - --include a.com,b.com is the same as --include a.com --include b.com
//
// 2. What is ArgAction::Count?
//    - Counts how many times a flag appears
//    - -v gives 1, -vv gives 2
//
// 3. What is ..defaults?
//    - "Struct update syntax": fill every field not listed from `defaults`
//    - Keeps into_options() short when Options grows new fields
// -----------------------------------------------------------------------------

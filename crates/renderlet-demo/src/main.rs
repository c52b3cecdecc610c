#![forbid(unsafe_code)]

//! Command-line demo: mount a view against a URL, wait for its outcome,
//! and print the wrapper HTML to stdout.
//!
//! Logs go to stderr; control verbosity with `RUST_LOG` (for example
//! `RUST_LOG=renderlet=debug`).

use std::cell::RefCell;
use std::process;
use std::rc::Rc;
use std::time::{Duration, Instant};

use clap::Parser;
use renderlet::{Content, HttpFetcher, Phase, Politeness, Renderlet, View};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "renderlet-demo",
    about = "Fetch JSON from a URL, render it, and print the resulting HTML",
    version
)]
struct Cli {
    /// URL to fetch JSON from.
    #[arg(long)]
    src: String,

    /// Give up waiting for an outcome after this many seconds.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// aria-live value for the wrapper: off, polite, or assertive.
    #[arg(long, default_value = "polite")]
    politeness: Politeness,

    /// Wrapper tag name.
    #[arg(long, default_value = "div")]
    tag: String,

    /// Pass-through wrapper attribute, as NAME=VALUE. Repeatable.
    #[arg(long = "attr", value_name = "NAME=VALUE")]
    attrs: Vec<String>,

    /// Render the JSON pretty-printed instead of compact.
    #[arg(long)]
    pretty: bool,

    /// Re-fetch this many times after the initial load.
    #[arg(long, default_value_t = 0)]
    refresh: u32,
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    if let Err(message) = run(cli) {
        eprintln!("{message}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    tracing::debug!(message = "demo.start", src = %cli.src, refresh = cli.refresh);
    let timeout = Duration::from_secs(cli.timeout_secs);
    let mut builder = Renderlet::new()
        .src(cli.src)
        .fetcher(HttpFetcher::with_timeout(timeout))
        .tag(cli.tag)
        .politeness(cli.politeness);
    for attr in &cli.attrs {
        let (name, value) = attr
            .split_once('=')
            .ok_or_else(|| format!("invalid --attr {attr:?} (expected NAME=VALUE)"))?;
        builder = builder.attr(name, value);
    }
    if cli.pretty {
        builder = builder.render_with(|value| {
            let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            Content::Text(text)
        });
    }

    let last_error: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
    let error_slot = Rc::clone(&last_error);
    let (view, handle) = builder
        .on_error(move |error| *error_slot.borrow_mut() = Some(error.to_string()))
        .mount();

    wait_for_outcome(&view, &last_error, timeout)?;
    for _ in 0..cli.refresh {
        handle.refresh();
        wait_for_outcome(&view, &last_error, timeout)?;
    }

    println!("{}", view.html());
    Ok(())
}

/// Pumps the view until the in-flight fetch resolves, then surfaces any
/// recorded error.
fn wait_for_outcome(
    view: &View,
    last_error: &Rc<RefCell<Option<String>>>,
    budget: Duration,
) -> Result<(), String> {
    let deadline = Instant::now() + budget;
    while view.phase() == Phase::Loading {
        let now = Instant::now();
        if now >= deadline {
            return Err(format!("no fetch outcome within {}s", budget.as_secs()));
        }
        view.tick_deadline(deadline - now);
    }
    if let Some(message) = last_error.borrow_mut().take() {
        return Err(message);
    }
    Ok(())
}

use std::path::Path;

use serde::Serialize;

use crate::config::{CONFIG_FILE, Config};
use crate::locator;

/// Exit codes shared by every command, with their meaning.
const EXIT_CODES: [(u8, &str); 4] = [
    (0, "Success"),
    (1, "Applied, but the match was a low-confidence guess"),
    (2, "Element not found, ambiguous in strict mode, or patch failed"),
    (3, "Runtime error (I/O, invalid JSON or TOML, watcher)"),
];

/// Output the pinpatch reference document for the current directory.
pub fn run(json: bool) {
    let state = gather_state(Path::new("."));

    if json {
        print_json(&state);
    } else {
        print_markdown(&state);
    }
}

// ── State gathering ───────────────────────────────────────────────────

/// Config as seen from the working directory.
struct CurrentState {
    /// Effective configuration (defaults when the file is absent or broken).
    config: Config,
    /// Parse error of a config file that exists but cannot be used.
    config_error: Option<String>,
    /// Whether the config file exists.
    config_found: bool,
}

/// Load the config the commands would use.
fn gather_state(root: &Path) -> CurrentState {
    let config_found = root.join(CONFIG_FILE).exists();
    return match Config::load(root) {
        Ok(config) => CurrentState { config, config_error: None, config_found },
        Err(e) => CurrentState { config: Config::default(), config_error: Some(e.to_string()), config_found },
    };
}

// ── Markdown output ───────────────────────────────────────────────────

/// Print the full markdown reference.
fn print_markdown(state: &CurrentState) {
    let version = env!("CARGO_PKG_VERSION");
    print_markdown_header(version);
    print_markdown_strategies();
    print_markdown_state(state);
    println!();
    print_markdown_exit_codes();
}

/// Usage and config reference.
fn print_markdown_header(version: &str) {
    print!(
        "\
# pinpatch {version}

Find the source line behind an element picked in a rendered page and patch it
in place, one line at a time.

## Workflow

    pinpatch locate page.html --fingerprint pick.json            Print line, confidence, strategy
    pinpatch patch page.html --fingerprint pick.json --text Hi   Replace text content
    pinpatch patch page.html --fingerprint pick.json --style color=red
    pinpatch patch page.html --fingerprint pick.json --attr src=new.png
    pinpatch patch page.html --fingerprint pick.json --html '<b>Hi</b>'
    pinpatch preview page.html --out preview.html                Render once
    pinpatch watch page.html --out preview.html                  Re-render on change

Add `--dry-run` to print the patched source instead of writing it, and
`--prune-classes` to drop utility classes that fight a `--style` edit.

## Configuration ({CONFIG_FILE})

    [locator]
    min_text_len = 3          # direct text must be longer than this to be matched
    strict = false            # refuse ambiguous guesses instead of flagging them

    [preview]
    fragment_width = \"1200px\"
    container_class = \"pinpatch-fragment\"

"
    );
}

/// Locator strategies in the order they are tried.
fn print_markdown_strategies() {
    println!("## Locator Strategies\n");
    for (i, name) in locator::strategy_names().iter().enumerate() {
        println!("{}. {name}", i.saturating_add(1));
    }
    println!("\n## Current State\n");
}

/// Effective configuration.
fn print_markdown_state(state: &CurrentState) {
    if state.config_found {
        println!("Config:     {CONFIG_FILE} (found)");
    } else {
        println!("Config:     {CONFIG_FILE} (not found, using defaults)");
    }
    if let Some(error) = &state.config_error {
        println!("Error:      {error}");
    }

    let locator = &state.config.locator;
    let preview = &state.config.preview;
    println!("Locator:    min_text_len = {}, strict = {}", locator.min_text_len, locator.strict);
    println!("Preview:    fragment_width = {}, container_class = {}", preview.fragment_width, preview.container_class);
}

/// Exit code table.
fn print_markdown_exit_codes() {
    println!("## Exit Codes\n");
    println!("| Code | Meaning |");
    println!("|------|---------|");
    for (code, meaning) in EXIT_CODES {
        println!("| {code}    | {meaning} |");
    }
}

// ── JSON output ───────────────────────────────────────────────────────

/// Top-level JSON document.
#[derive(Serialize)]
struct InfoJson {
    /// Current working-directory state.
    current_state: StateJson,
    /// Exit code table.
    exit_codes: Vec<ExitCodeInfo>,
    /// Locator strategies in order.
    strategies: Vec<&'static str>,
    /// Crate version.
    version: String,
}

/// One exit code row.
#[derive(Serialize)]
struct ExitCodeInfo {
    /// Process exit code.
    code: u8,
    /// What it means.
    meaning: String,
}

/// JSON form of [`CurrentState`].
#[derive(Serialize)]
struct StateJson {
    /// Effective configuration.
    config: Config,
    /// Config parse error, if any.
    config_error: Option<String>,
    /// Whether the config file exists.
    config_found: bool,
}

/// Print the reference as pretty JSON.
fn print_json(state: &CurrentState) {
    let info = InfoJson {
        current_state: StateJson {
            config: state.config.clone(),
            config_error: state.config_error.clone(),
            config_found: state.config_found,
        },
        exit_codes: EXIT_CODES
            .iter()
            .map(|(code, meaning)| return ExitCodeInfo { code: *code, meaning: (*meaning).to_string() })
            .collect(),
        strategies: locator::strategy_names(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    // serde_json::to_string_pretty won't fail on this structure.
    let json = serde_json::to_string_pretty(&info).unwrap_or_default();
    println!("{json}");
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use pinpatch::types::EditIntent;
use pinpatch::{commands, diagnostics, info, watch};

#[derive(Parser)]
#[command(name = "pinpatch", version, about = "Locate a picked element in HTML source and patch it in place")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the source line a fingerprint points at
    Locate {
        /// HTML source file
        file: PathBuf,
        /// Fingerprint JSON captured from the rendered page
        #[arg(long)]
        fingerprint: PathBuf,
    },
    /// Locate an element and rewrite its source line
    Patch {
        /// HTML source file
        file: PathBuf,
        /// Fingerprint JSON captured from the rendered page
        #[arg(long)]
        fingerprint: PathBuf,
        #[command(flatten)]
        edit: EditArgs,
        /// With --style, drop utility classes that set the same property
        #[arg(long, requires = "style")]
        prune_classes: bool,
        /// Print the patched source instead of writing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Render the source once into a standalone preview document
    Preview {
        /// HTML source file or fragment
        file: PathBuf,
        /// Where to write the rendered document
        #[arg(long)]
        out: PathBuf,
    },
    /// Keep the preview in sync while the source is regenerated
    Watch {
        /// HTML source file or fragment
        file: PathBuf,
        /// Where to write the rendered document
        #[arg(long)]
        out: PathBuf,
    },
    /// Show usage, configuration, and exit codes
    Info {
        /// Output as JSON instead of markdown
        #[arg(long)]
        json: bool,
    },
}

/// Exactly one edit per patch call.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct EditArgs {
    /// Set an inline style property: `name=value` (camelCase names accepted)
    #[arg(long, value_parser = parse_key_value)]
    style: Option<(String, String)>,
    /// Replace the element's text content
    #[arg(long)]
    text: Option<String>,
    /// Replace the element's inner markup (single line)
    #[arg(long)]
    html: Option<String>,
    /// Set an attribute: `name=value`
    #[arg(long, value_parser = parse_key_value)]
    attr: Option<(String, String)>,
}

impl EditArgs {
    /// The edit intent these flags describe.
    fn into_intent(self, prune_classes: bool) -> Option<EditIntent> {
        if let Some((name, value)) = self.style {
            return Some(EditIntent::StyleProperty { name, prune_classes, value });
        }
        if let Some(value) = self.text {
            return Some(EditIntent::TextContent { value });
        }
        if let Some(value) = self.html {
            return Some(EditIntent::InnerHtml { value });
        }
        return self.attr.map(|(name, value)| return EditIntent::Attribute { name, value });
    }
}

/// Parse `name=value`.
fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw.split_once('=').ok_or_else(|| return format!("expected name=value, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in `{raw}`"));
    }
    return Ok((name.to_string(), value.to_string()));
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Locate { file, fingerprint } => commands::locate(&file, &fingerprint),
        Commands::Patch { file, fingerprint, edit, prune_classes, dry_run } => match edit.into_intent(prune_classes) {
            Some(intent) => commands::patch(&file, &fingerprint, &intent, dry_run),
            None => {
                eprintln!("error: one of --style, --text, --html, --attr is required");
                return ExitCode::from(3_u8);
            },
        },
        Commands::Preview { file, out } => commands::preview(&file, &out).map(|()| return ExitCode::SUCCESS),
        Commands::Watch { file, out } => watch::run(&file, &out),
        Commands::Info { json } => {
            info::run(json);
            Ok(ExitCode::SUCCESS)
        },
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            commands::exit_code_for(&e)
        },
    };
}

mod present;
mod test_runner;

use std::io::Write;
use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use deck::{Page, TITLE_ATTRIBUTE, TOC_ID};
use viewer::render::{render_html, render_text};
use viewer::{KeyEvent, Session, Viewer, ViewerError};

const SUBCOMMANDS: &[&str] = &["show", "present", "export", "test", "help"];

#[derive(Parser)]
#[command(name = "deck", version, about = "Present Markdown decks one section at a time")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log navigation to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the view of a deck after loading it
    Show(ShowArgs),

    /// Step through a deck interactively, one command per line
    Present(PresentArgs),

    /// Write the loaded deck as a standalone HTML page
    Export(ExportArgs),

    /// Run .test.md scenario files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct ShowArgs {
    /// Markdown deck to load
    file: String,

    /// Address fragment to open the deck at, e.g. 3 or #3
    #[arg(short, long)]
    fragment: Option<String>,

    /// Keys to press after loading, e.g. ArrowRight or Shift+Space. Repeatable.
    #[arg(short, long)]
    key: Vec<String>,

    /// Parse only (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Dump the parsed document tree
    #[arg(long)]
    tree: bool,

    /// List all sections with their index
    #[arg(long)]
    list_sections: bool,
}

#[derive(clap::Args)]
struct PresentArgs {
    /// Markdown deck to present
    file: String,

    /// Address fragment to open the deck at
    #[arg(short, long)]
    fragment: Option<String>,
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Markdown deck to export
    file: String,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,

    /// Address fragment naming the section to export as visible
    #[arg(short, long)]
    fragment: Option<String>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: String,

    /// Run only scenarios in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `deck file.md` works like `deck show file.md`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().skip(1).position(|a| !a.starts_with('-')) {
        let pos = pos + 1;
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "show".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    match cli.command {
        Command::Show(show_args) => do_show(show_args, color_choice),
        Command::Present(present_args) => {
            let page = load_page(&present_args.file, color_choice);
            let url = address(&present_args.file, present_args.fragment.as_deref());
            let viewer = Viewer::load(page, Session::open(&url));
            if let Err(e) = present::run(viewer, std::io::stdin().lock(), std::io::stdout()) {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
        Command::Export(export_args) => do_export(export_args, color_choice),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

/// Session address for a deck file opened at `fragment`.
fn address(file: &str, fragment: Option<&str>) -> String {
    match fragment {
        Some(fragment) => format!("{}#{}", file, fragment.trim_start_matches('#')),
        None => file.to_string(),
    }
}

/// Read and parse a deck, reporting failures and exiting.
fn load_page(file: &str, color_choice: ColorChoice) -> Page {
    match viewer::open_page(file) {
        Ok(page) => page,
        Err(ViewerError::Parse {
            name,
            source,
            errors,
        }) => {
            let mut files = SimpleFiles::new();
            files.add(name, source);
            let writer = StandardStream::stderr(color_choice);
            let config = term::Config::default();
            for error in &errors {
                let diagnostic = error.to_diagnostic();
                let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            }
            process::exit(1);
        }
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn do_show(args: ShowArgs, color_choice: ColorChoice) {
    let page = load_page(&args.file, color_choice);

    // --check: parse succeeded, exit
    if args.check {
        eprintln!("ok: {} parsed successfully", args.file);
        return;
    }

    // --tree: dump the document as parsed
    if args.tree {
        println!("{:#?}", page.dom);
        return;
    }

    // --list-sections: print index and title of every section
    if args.list_sections {
        for (index, section) in page.sections().into_iter().enumerate() {
            let title = page
                .dom
                .attribute(section, TITLE_ATTRIBUTE)
                .unwrap_or("(untitled)");
            let marker = if page.dom.id(section) == Some(TOC_ID) {
                " (contents)"
            } else {
                ""
            };
            println!("{:>3}  {}{}", index, title, marker);
        }
        return;
    }

    let mut keys = Vec::new();
    for key in &args.key {
        match key.parse::<KeyEvent>() {
            Ok(key) => keys.push(key),
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(2);
            }
        }
    }

    let url = address(&args.file, args.fragment.as_deref());
    let mut viewer = Viewer::load(page, Session::open(&url));
    for key in keys {
        viewer.key(key);
    }

    println!("{}", status_line(&viewer));
    println!();
    print!("{}", render_text(viewer.dom()));
}

fn do_export(args: ExportArgs, color_choice: ColorChoice) {
    let page = load_page(&args.file, color_choice);
    let url = address(&args.file, args.fragment.as_deref());
    let viewer = Viewer::load(page, Session::open(&url));
    let html = render_html(viewer.page(), viewer.title());

    let result = match &args.output {
        Some(output) => std::fs::write(output, html),
        None => std::io::stdout().write_all(html.as_bytes()),
    };
    if let Err(e) = result {
        eprintln!(
            "error: cannot write '{}': {}",
            args.output.as_deref().unwrap_or("<stdout>"),
            e
        );
        process::exit(1);
    }
}

/// `[2/3] Title – Section  deck.md#2`
pub fn status_line(viewer: &Viewer<Session>) -> String {
    format!(
        "[{}/{}] {}  {}",
        viewer.current_index(),
        viewer.controller().section_count().saturating_sub(1),
        viewer.title(),
        viewer.host().location()
    )
}

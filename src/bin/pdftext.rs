//! CLI tool for PDF text extraction

use pdf_text_layout::{
    par_extract_selected, parse_page_range, Document, ExtractConfig, LayoutMode,
    DEFAULT_PAGE_SEPARATOR, DEFAULT_PAGE_WIDTH,
};
use std::env;
use std::fs;
use std::process;
use std::time::Instant;

const USAGE: &str = "Usage: pdftext [options] <input.pdf> [output.txt]

Extracts text from a PDF, rebuilding words and lines from glyph positions.

Options:
  --layout           Preserve the physical layout on an 80-column grid
  --raw              Join runs with the stream-order word policy
  --pages RANGE      Pages to extract, e.g. '1-5' or '1,3,5' (default: all)
  --separator SEP    Text between pages (default: two newlines; \\n, \\t, \\f unescaped)
  --width POINTS     Page width for --layout (default: 612)
  --password PW      Password for an encrypted PDF
  -h, --help         Show this help
  -V, --version      Show the version";

struct Args {
    config: ExtractConfig,
    pages: String,
    password: Option<String>,
    input: String,
    output: Option<String>,
}

fn main() {
    env_logger::init();

    let args = match parse_args(env::args().skip(1).collect()) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            eprintln!();
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();

    let doc = match &args.password {
        Some(password) => Document::load_with_password(&args.input, password)?,
        None => Document::load(&args.input)?,
    };
    let pages = parse_page_range(&args.pages, doc.page_count())?;
    let texts = par_extract_selected(&doc, &pages, &args.config)?;
    let output = texts.join(&args.config.page_separator);

    match &args.output {
        Some(path) => {
            fs::write(path, &output)?;
            eprintln!(
                "Text extracted to {} ({} pages, {} layout, {}ms)",
                path,
                pages.len(),
                args.config.layout,
                start.elapsed().as_millis()
            );
        }
        None => {
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

fn parse_args(raw: Vec<String>) -> Result<Args, String> {
    let mut layout = LayoutMode::Simple;
    let mut pages = String::new();
    let mut separator = DEFAULT_PAGE_SEPARATOR.to_string();
    let mut width = DEFAULT_PAGE_WIDTH;
    let mut password = None;
    let mut positional = Vec::new();

    let mut iter = raw.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            "-V" | "--version" => {
                println!("pdftext v{}", env!("CARGO_PKG_VERSION"));
                process::exit(0);
            }
            "--layout" => layout = LayoutMode::Physical,
            "--raw" => {
                if layout != LayoutMode::Physical {
                    layout = LayoutMode::Raw;
                }
            }
            "--pages" => pages = value_for(&arg, iter.next())?,
            "--password" => password = Some(value_for(&arg, iter.next())?),
            "--separator" => separator = unescape(&value_for(&arg, iter.next())?),
            "--width" => {
                let value = value_for(&arg, iter.next())?;
                width = value
                    .parse()
                    .map_err(|_| format!("invalid page width: {}", value))?;
            }
            other if other.starts_with("--") => return Err(format!("unknown option: {}", other)),
            other => positional.push(other.to_string()),
        }
    }

    let mut positional = positional.into_iter();
    let input = positional
        .next()
        .ok_or_else(|| "input PDF file is required".to_string())?;
    let output = positional.next();
    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument: {}", extra));
    }

    let config = ExtractConfig::new(layout, separator, width).map_err(|e| e.to_string())?;
    Ok(Args {
        config,
        pages,
        password,
        input,
        output,
    })
}

fn value_for(flag: &str, value: Option<String>) -> Result<String, String> {
    value.ok_or_else(|| format!("{} requires a value", flag))
}

fn unescape(s: &str) -> String {
    s.replace("\\n", "\n")
        .replace("\\t", "\t")
        .replace("\\f", "\x0c")
}

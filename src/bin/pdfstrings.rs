//! Lists the string literals a PDF carries, from the raw file bytes and from
//! each page's content stream

use log::warn;
use pdf_text_layout::strings::clean_literals;
use pdf_text_layout::{content_string_literals, extract_string_literals, Document};
use std::env;
use std::fs;
use std::process;

const USAGE: &str = "Usage: pdfstrings [--password PW] <input.pdf>";

fn main() {
    env_logger::init();

    let mut password = None;
    let mut input = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", USAGE);
                return;
            }
            "--password" => match args.next() {
                Some(pw) => password = Some(pw),
                None => fail("--password requires a value"),
            },
            other if other.starts_with("--") => fail(&format!("unknown option: {}", other)),
            other => input = Some(other.to_string()),
        }
    }
    let Some(path) = input else {
        fail("input PDF file is required");
    };

    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => fail(&format!("cannot read {}: {}", path, e)),
    };

    println!("Analyzing PDF: {}", path);
    println!("{}", "=".repeat(path.len() + 15));

    println!("\n1. Raw byte scan:");
    let raw = extract_string_literals(&bytes);
    print_strings(&raw);

    println!("\n2. Content streams:");
    let opened = match &password {
        Some(pw) => Document::load_mem_with_password(&bytes, pw),
        None => Document::load_mem(&bytes),
    };
    match opened {
        Ok(doc) => {
            let mut shown = Vec::new();
            for page in 1..=doc.page_count() {
                match doc.content_stream(page) {
                    Ok(content) => shown.extend(content_string_literals(&content)),
                    Err(e) => warn!("skipping page {}: {}", page, e),
                }
            }
            print_strings(&clean_literals(shown));
            println!("Pages: {}", doc.page_count());
        }
        Err(e) => eprintln!("Content stream scan failed: {}", e),
    }

    println!("Unique strings in raw scan: {}", raw.len());
}

fn print_strings(strings: &[String]) {
    println!("Found {} unique string literals\n", strings.len());
    for (i, s) in strings.iter().enumerate() {
        println!("{:3}. {}", i + 1, s);
        if s.chars().count() < 50 {
            let hex: Vec<String> = s.chars().map(|c| format!("{:02X}", c as u32)).collect();
            println!("     Hex: {}", hex.join(" "));
        }
        println!();
    }
}

fn fail(msg: &str) -> ! {
    eprintln!("Error: {}", msg);
    eprintln!("{}", USAGE);
    process::exit(1);
}

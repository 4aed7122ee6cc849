use pdf_text_layout::{Conservative, Document, RowSource, StreamOrder};
use std::env;

fn main() {
    env_logger::init();

    let path = env::args().nth(1).expect("Need PDF path");
    let page: u32 = env::args()
        .nth(2)
        .map(|p| p.parse().expect("Page must be a number"))
        .unwrap_or(1);

    let doc = Document::load(&path).expect("Failed to open PDF");
    let source = doc.source().expect("Document closed");
    let rows = source.rows(page).expect("Failed to read rows");

    for row in &rows {
        let runs = row.sorted_runs();
        let min_char_width = Conservative::min_char_width(&runs);
        println!(
            "Row y={} ({} runs, minCharW: {:.2})",
            row.vertical_anchor,
            runs.len(),
            min_char_width
        );

        for pair in runs.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            let simple = Conservative::decide(min_char_width, prev, curr);
            let raw = StreamOrder::decide(prev, curr);
            println!(
                "  simple gap {:6.2} > {:5.2} {} | raw gap {:6.2} > {:5.2} {} | '{}' -> '{}'",
                simple.gap,
                simple.threshold,
                if simple.insert_space { "SPACE" } else { "join " },
                raw.gap,
                raw.threshold,
                if raw.insert_space { "SPACE" } else { "join " },
                prev.text.chars().take(20).collect::<String>(),
                curr.text.chars().take(20).collect::<String>()
            );
        }
    }
}

use criterion::Criterion;
use criterion::black_box;
use criterion::criterion_group;
use criterion::criterion_main;
use ratatui_mdtree::MarkdownDocument;
use ratatui_mdtree::MarkdownOptions;
use ratatui_mdtree::ast::MarkdownParser;
use ratatui_mdtree::builder::BuilderOptions;
use ratatui_mdtree::builder::MarkdownBuilder;
use ratatui_mdtree::html::normalize_html_lists;
use ratatui_mdtree::style::StyleSheet;
use ratatui_mdtree_syntax::syntect::SyntectHighlighter;
use std::sync::Arc;

fn sample_markdown(rows: usize) -> String {
    let mut s = String::new();
    s.push_str("# Performance\n\n");
    s.push_str("This is a long paragraph to stress wrapping. ");
    for _ in 0..12 {
        s.push_str("The quick brown fox jumps over the lazy dog. ");
    }
    s.push_str("H<sub>2</sub>O and E = mc<sup>2</sup>, <u>underlined</u><br>next line.\n\n");

    s.push_str("## Task List\n\n");
    s.push_str("- [x] task list item\n");
    s.push_str("- [ ] task list item\n\n");

    s.push_str("<ul><li>raw<ol><li>nested</li><li>list</li></ol></li><li>items</li></ul>\n\n");

    s.push_str("## Table\n\n");
    s.push_str("| Name | Value | Notes |\n");
    s.push_str("|:-----|------:|:------|\n");
    for i in 0..rows {
        s.push_str(&format!(
            "| row {i} | {} | wraps when the terminal is narrow |\n",
            i * 7
        ));
    }
    s.push('\n');

    s.push_str("## Code\n\n");
    s.push_str("```rs\n");
    s.push_str("fn main() {\n");
    for i in 0..50 {
        s.push_str(&format!("    let x{i} = {i} + 1;\n"));
    }
    s.push_str("}\n");
    s.push_str("```\n");
    s
}

fn bench_build(c: &mut Criterion) {
    let md = sample_markdown(200);
    let nodes = MarkdownParser::new().parse(&normalize_html_lists(&md));
    c.bench_function("build_tree/build", |b| {
        let mut builder = MarkdownBuilder::new(StyleSheet::default(), BuilderOptions::default())
            .expect("default style sheet is valid");
        b.iter(|| {
            let tree = builder.build(black_box(&nodes));
            black_box(tree.nodes().len());
        })
    });
}

fn bench_parse_build_layout(c: &mut Criterion) {
    let md = sample_markdown(200);
    let options = MarkdownOptions {
        style_sheet: StyleSheet {
            enable_interactive_table: true,
            ..StyleSheet::default()
        },
        ..MarkdownOptions::default()
    };
    c.bench_function("build_tree/parse+build+layout", |b| {
        b.iter(|| {
            let mut doc = MarkdownDocument::parse(black_box(md.as_str()), &options)
                .expect("default style sheet is valid");
            let rendered = doc.render(black_box(96));
            black_box(rendered.content_height);
        })
    });
}

fn bench_syntect(c: &mut Criterion) {
    let md = sample_markdown(20);
    let hi = Arc::new(SyntectHighlighter::default());
    let options = MarkdownOptions::default();
    c.bench_function("build_tree/parse+build+layout/syntect", |b| {
        b.iter(|| {
            let mut doc =
                MarkdownDocument::parse_with_highlighter(black_box(md.as_str()), &options, Some(hi.clone()))
                    .expect("default style sheet is valid");
            let rendered = doc.render(black_box(96));
            black_box(rendered.content_height);
        })
    });
}

criterion_group!(
    benches,
    bench_build,
    bench_parse_build_layout,
    bench_syntect
);
criterion_main!(benches);

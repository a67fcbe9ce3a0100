use std::collections::BTreeSet;

use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui_mdtree::ast::Element;
use ratatui_mdtree::ast::MarkdownParser;
use ratatui_mdtree::ast::Node;
use ratatui_mdtree::builder::BuilderOptions;
use ratatui_mdtree::builder::MarkdownBuilder;
use ratatui_mdtree::html::normalize_html_lists;
use ratatui_mdtree::interactive::InteractiveAction;
use ratatui_mdtree::interactive::InteractiveTableView;
use ratatui_mdtree::sticky::OverlayRegion;
use ratatui_mdtree::sticky::StickyCell;
use ratatui_mdtree::sticky::StickyTable;
use ratatui_mdtree::sticky::StickyTableRenderer;
use ratatui_mdtree::style::StyleSheet;
use ratatui_mdtree::table::TablePresentation;
use ratatui_mdtree::tree::InlineNode;
use ratatui_mdtree::tree::MarkdownTree;
use ratatui_mdtree::tree::RenderNode;
use ratatui_mdtree_core::input::GesturePhase;
use ratatui_mdtree_core::input::InputEvent;
use ratatui_mdtree_core::input::ScaleEvent;

fn build_with(src: &str, sheet: StyleSheet) -> MarkdownTree {
    let nodes = MarkdownParser::new().parse(src);
    MarkdownBuilder::new(sheet, BuilderOptions::default())
        .expect("valid style sheet")
        .build(&nodes)
}

fn build(src: &str) -> MarkdownTree {
    build_with(src, StyleSheet::default())
}

/// Spans of the first paragraph-like run found in `nodes`.
fn first_run(nodes: &[RenderNode]) -> Option<Vec<(String, bool)>> {
    for node in nodes {
        match node {
            RenderNode::Column(children) => {
                if let Some(run) = first_run(children) {
                    return Some(run);
                }
            }
            RenderNode::Wrap(wrap) => {
                for child in &wrap.children {
                    if let InlineNode::Rich { spans, .. } = child {
                        return Some(
                            spans
                                .iter()
                                .map(|s| (s.text.clone(), s.link.is_some()))
                                .collect(),
                        );
                    }
                }
            }
            _ => {}
        }
    }
    None
}

fn nbsp_indent(line: &str) -> usize {
    line.chars().take_while(|c| *c == '\u{a0}').count()
}

#[test]
fn normalized_lists_have_one_line_per_item_with_growing_indent() {
    let src = "<ul><li>a<ol><li>b<ul><li>c</li></ul></li><li>d</li></ol></li><li>e</li></ul>";
    let out = normalize_html_lists(src);
    let lines: Vec<&str> = out.split("<br>").collect();
    assert_eq!(lines.len(), 5);

    let indents: Vec<usize> = lines.iter().map(|l| nbsp_indent(l)).collect();
    assert_eq!(indents, vec![2, 4, 6, 4, 2]);

    let bodies: Vec<&str> = lines.iter().map(|l| l.trim_start_matches('\u{a0}')).collect();
    assert_eq!(bodies, vec!["• a", "1. b", "• c", "2. d", "• e"]);
}

#[test]
fn ordinals_restart_in_every_list() {
    let out = normalize_html_lists("<ol><li>x</li><li>y</li></ol>\n\n<ol><li>z</li></ol>");
    assert!(out.contains("1. x"));
    assert!(out.contains("2. y"));
    assert!(out.contains("1. z"));
}

#[test]
fn mismatched_delimiter_row_is_not_a_table() {
    let tree = build("| abc | def |\n| --- |\n| bar |");
    assert!(tree.tables().is_empty());
    let run = first_run(tree.nodes()).expect("paragraph");
    let text: String = run.iter().map(|(t, _)| t.as_str()).collect();
    assert!(text.contains("abc"));
    assert!(text.contains("bar"));
}

#[test]
fn empty_trailing_rows_are_kept() {
    let tree = build("|Header 1|Header 2|\n|----|----|\n| | |");
    let tables = tree.tables();
    assert_eq!(tables.len(), 1);
    let grid = &tables[0].grid;
    assert_eq!(grid.row_count(), 2);
    assert_eq!(grid.column_count(), 2);
    for cell in &grid.rows[1].cells {
        let text: String = cell
            .children
            .iter()
            .filter_map(|c| match c {
                InlineNode::Rich { spans, .. } => {
                    Some(spans.iter().map(|s| s.text.as_str()).collect::<String>())
                }
                InlineNode::Span(s) => Some(s.text.clone()),
                InlineNode::Block(_) => None,
            })
            .collect();
        assert_eq!(text.trim(), "");
    }
}

#[test]
fn building_twice_yields_equal_trees() {
    let src = "# Title\n\nSome *text* with a [link](https://example.com).\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n> quote\n\n1. one\n2. two\n";
    let nodes = MarkdownParser::new().parse(src);
    let mut builder =
        MarkdownBuilder::new(StyleSheet::default(), BuilderOptions::default()).expect("valid");
    let first = builder.build(&nodes);
    let second = builder.build(&nodes);
    assert_eq!(first, second);
}

#[test]
fn adjacent_spans_merge_only_when_indistinguishable() {
    let paragraph = Element::new("p")
        .with_child(Node::Text("foo".to_string()))
        .with_child(Node::Text("bar".to_string()));
    let mut builder =
        MarkdownBuilder::new(StyleSheet::default(), BuilderOptions::default()).expect("valid");
    let tree = builder.build(&[Node::Element(paragraph)]);
    assert_eq!(
        first_run(tree.nodes()),
        Some(vec![("foobar".to_string(), false)])
    );

    let paragraph = Element::new("p")
        .with_child(Node::Text("foo".to_string()))
        .with_child(Node::Element(
            Element::new("a")
                .with_attr("href", "https://example.com")
                .with_child(Node::Text("bar".to_string())),
        ));
    let tree = builder.build(&[Node::Element(paragraph)]);
    assert_eq!(
        first_run(tree.nodes()),
        Some(vec![("foo".to_string(), false), ("bar".to_string(), true)])
    );
}

#[test]
fn interactive_off_falls_back_to_a_scrollable_grid() {
    let src = "| a | b |\n|---|---|\n| 1 | 2 |\n";
    let tree = build(src);
    assert_eq!(tree.tables()[0].presentation, TablePresentation::Scrollable);
    assert!(tree.tables()[0].zoomable().is_none());

    let tree = build_with(
        src,
        StyleSheet {
            enable_interactive_table: true,
            ..StyleSheet::default()
        },
    );
    assert!(tree.tables()[0].zoomable().is_some());
}

#[test]
fn overlays_never_paint_a_cell_twice() {
    let rows = (0..3)
        .map(|r| {
            (0..3)
                .map(|c| StickyCell::new(vec![Line::from(format!("{r}{c}"))]))
                .collect()
        })
        .collect();
    let table = StickyTable::new(rows, vec![2, 2, 2]).expect("rectangular grid");
    let mut renderer = StickyTableRenderer::new(table);
    renderer.set_column_max_fraction(1.0);

    for r in 0..=3 {
        for c in 0..=3 {
            renderer.set_sticky_rows(r);
            renderer.set_sticky_columns(c);
            let mut painted = BTreeSet::new();
            let mut intersection = BTreeSet::new();
            for pass in renderer.overlay_plan(Rect::new(0, 0, 40, 10)) {
                for row in pass.rows.clone() {
                    for col in pass.columns.clone() {
                        assert!(painted.insert((row, col)), "({row}, {col}) painted twice");
                        if pass.region == OverlayRegion::Intersection {
                            intersection.insert((row, col));
                        }
                    }
                }
            }
            let expected: BTreeSet<_> = (0..3)
                .flat_map(|row| (0..3).map(move |col| (row, col)))
                .filter(|(row, col)| *row < r || *col < c)
                .collect();
            assert_eq!(painted, expected);
            let corner: BTreeSet<_> = (0..r)
                .flat_map(|row| (0..c).map(move |col| (row, col)))
                .collect();
            assert_eq!(intersection, corner);
        }
    }
}

#[test]
fn pinch_scale_stays_within_bounds() {
    let nodes = MarkdownParser::new().parse("| a | b |\n|---|---|\n| 1 | 2 |\n");
    let Some(Node::Element(table)) = nodes.first() else {
        panic!("expected a table element");
    };
    let mut view =
        InteractiveTableView::open(table, &StyleSheet::default(), &BuilderOptions::default())
            .expect("table opens");

    for factor in [0.0, 0.2, 0.9, 1.5, 2.9, 3.1, 50.0, f32::INFINITY, f32::NAN] {
        view.handle_event(InputEvent::Scale(ScaleEvent {
            phase: GesturePhase::Start,
            pointer_count: 2,
            scale: 1.0,
        }));
        let action = view.handle_event(InputEvent::Scale(ScaleEvent {
            phase: GesturePhase::Update,
            pointer_count: 2,
            scale: factor,
        }));
        assert!(matches!(
            action,
            InteractiveAction::None | InteractiveAction::Relayout
        ));
        assert!((1.0..=3.0).contains(&view.scale()), "scale {}", view.scale());
        view.handle_event(InputEvent::Scale(ScaleEvent {
            phase: GesturePhase::End,
            pointer_count: 2,
            scale: factor,
        }));
    }
}

//! Listing lexer, parser and tree traversal.

use textharvest::listing::{ListingLexer, TokenKind, parse_listing};
use textharvest::{NodeKind, ParseSettings, TreeNode};

const SAMPLE: &str = "A\n\tB.pdf<H:1>\n\tC.png<H:2>\nD.pdf<H:3>\n";

fn abs_names<'a>(nodes: impl Iterator<Item = &'a TreeNode>) -> Vec<&'a str> {
    nodes.map(TreeNode::absolute_name).collect()
}

#[test]
fn sample_listing_builds_expected_tree() {
    let settings = ParseSettings::new(&[".pdf"]);
    let tree = parse_listing("R", SAMPLE, &settings);

    let root = tree.root();
    assert_eq!(root.absolute_name(), "R");
    assert_eq!(root.children().len(), 2);
    let a = &root.children()[0];
    assert_eq!(a.absolute_name(), "R/A");
    assert_eq!(a.kind(), NodeKind::Directory);
    assert_eq!(abs_names(a.children().iter()), vec!["R/A/B.pdf"]);
    assert_eq!(root.children()[1].absolute_name(), "R/D.pdf");

    assert_eq!(abs_names(tree.files()), vec!["R/A/B.pdf", "R/D.pdf"]);
    assert!(tree.find("R/A/C.png").is_none());
}

#[test]
fn lexer_classifies_by_extension_and_counts_tabs() {
    let settings = ParseSettings::new(&[".pdf"]);
    let text = "notes.pdf<H:abc>\n\t\timage.png<H:xyz>\n\n\tFolder name<H:d1>\n";
    let tokens: Vec<_> = ListingLexer::new(text, &settings).collect();

    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0].kind, TokenKind::File);
    assert_eq!(tokens[0].name, "notes.pdf");
    assert_eq!(tokens[0].handle.as_deref(), Some("abc"));
    assert_eq!(tokens[0].depth, 0);

    assert_eq!(tokens[1].kind, TokenKind::Skip);
    assert_eq!(tokens[1].depth, 2);

    assert_eq!(tokens[2].kind, TokenKind::Directory);
    assert_eq!(tokens[2].name, "Folder name");
    assert_eq!(tokens[2].depth, 1);
}

#[test]
fn extension_match_is_case_insensitive() {
    let settings = ParseSettings::new(&[".pdf"]);
    let tokens: Vec<_> = ListingLexer::new("SCAN.PDF<H:1>", &settings).collect();
    assert_eq!(tokens[0].kind, TokenKind::File);
}

#[test]
fn counts_and_names_follow_ancestor_chain() {
    let listing = "\
Algebra<H:a>
\tExams<H:ae>
\t\tfinal.pdf<H:1>
\t\tmidterm.pdf<H:2>
\tHomework<H:ah>
\t\t1.pdf<H:3>
Calculus<H:c>
\tnotes.txt<H:4>
\tDeep<H:cd>
\t\tDeeper<H:cdd>
\t\t\tx.doc<H:5>
readme.txt<H:6>
";
    let tree = parse_listing("CS", listing, &ParseSettings::default());

    assert_eq!(tree.files().count(), 6);
    // root, Algebra, Exams, Homework, Calculus, Deep, Deeper
    assert_eq!(tree.directories().count(), 7);
    assert_eq!(tree.len(), 13);

    for node in &tree {
        let expected_last = node.absolute_name().rsplit('/').next().unwrap();
        assert_eq!(node.relative_name(), expected_last);
        for child in node.children() {
            assert_eq!(
                child.absolute_name(),
                format!("{}/{}", node.absolute_name(), child.relative_name())
            );
        }
        if node.is_file() {
            assert!(node.children().is_empty());
        }
    }
    assert!(tree.find("CS/Calculus/Deep/Deeper/x.doc").is_some());
}

#[test]
fn allowed_fragment_keeps_only_matching_branch() {
    let listing = "\
Algebra<H:a>
\tExams<H:ae>
\t\tfinal.pdf<H:1>
\tHomework<H:ah>
\t\t1.pdf<H:2>
Geometry<H:g>
\tg.pdf<H:3>
";
    let settings = ParseSettings::new(&[".pdf"]).with_allowed_paths(&["Algebra/Exams"]);
    let tree = parse_listing("root", listing, &settings);

    assert_eq!(abs_names(tree.files()), vec!["root/Algebra/Exams/final.pdf"]);
    assert!(tree.find("root/Algebra/Homework").is_none());
    assert!(tree.find("root/Algebra/Homework/1.pdf").is_none());
    assert!(tree.find("root/Geometry").is_none());
    assert_eq!(
        abs_names(tree.directories()),
        vec!["root", "root/Algebra", "root/Algebra/Exams"]
    );
}

#[test]
fn skipped_entry_hides_its_subtree() {
    let listing = "\
bundle.zip<H:z>
\tinner.pdf<H:1>
kept.pdf<H:2>
";
    let tree = parse_listing("R", listing, &ParseSettings::new(&[".pdf"]));
    assert_eq!(abs_names(tree.files()), vec!["R/kept.pdf"]);
}

#[test]
fn dedent_returns_to_correct_parent() {
    let listing = "A\n\tB\n\t\tC\n\t\t\tc.txt\n\tb.txt\nz.txt\n";
    let tree = parse_listing("R", listing, &ParseSettings::new(&[".txt"]));
    assert_eq!(
        abs_names(tree.files()),
        vec!["R/A/B/C/c.txt", "R/A/b.txt", "R/z.txt"]
    );
}

#[test]
fn file_handle_policy() {
    let listing = "Dir<H:dir>\n\tf.pdf<H:file>\n";

    let inherit = parse_listing("R", listing, &ParseSettings::new(&[".pdf"]));
    let file = inherit.find("R/Dir/f.pdf").unwrap();
    assert_eq!(file.handle(), Some("dir"));

    let mut own = ParseSettings::new(&[".pdf"]);
    own.file_handle_inherits_parent = false;
    let tree = parse_listing("R", listing, &own);
    assert_eq!(tree.find("R/Dir/f.pdf").unwrap().handle(), Some("file"));
    assert_eq!(tree.find("R/Dir").unwrap().handle(), Some("dir"));
}

#[test]
fn missing_handle_marker_is_tolerated() {
    let tree = parse_listing("R", "Dir\n\tf.pdf\n", &ParseSettings::new(&[".pdf"]));
    let dir = tree.find("R/Dir").unwrap();
    assert_eq!(dir.handle(), None);
    assert_eq!(tree.files().count(), 1);
}

#[test]
fn traversal_is_restartable() {
    let tree = parse_listing("R", SAMPLE, &ParseSettings::new(&[".pdf"]));
    let first = abs_names(tree.iter());
    let second = abs_names(tree.iter());
    assert_eq!(first, vec!["R", "R/A", "R/A/B.pdf", "R/D.pdf"]);
    assert_eq!(first, second);
}

#[test]
fn pretty_indents_two_spaces_per_level() {
    let tree = parse_listing("R", SAMPLE, &ParseSettings::new(&[".pdf"]));
    assert_eq!(tree.pretty(), "- R\n  - A\n    - B.pdf\n  - D.pdf\n");
}

#[test]
fn empty_listing_has_only_root() {
    let tree = parse_listing("R", "\n\n", &ParseSettings::default());
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 1);
    assert!(tree.file_list().is_empty());
}

#[test]
fn file_list_is_detached() {
    let tree = parse_listing("R", SAMPLE, &ParseSettings::new(&[".pdf"]));
    let files = tree.file_list();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].path_without_root(), "A/B.pdf");
    assert_eq!(files[0].handle(), None);
    assert_eq!(files[1].path_without_root(), "D.pdf");
}

#[test]
fn repeated_entries_keep_first_node() {
    let listing = "\
a.txt<H:1>
a.txt<H:2>
Dir<H:d1>
\tx.txt<H:3>
Dir<H:d2>
\ty.txt<H:4>
\tx.txt<H:5>
";
    let mut settings = ParseSettings::new(&[".txt"]);
    settings.file_handle_inherits_parent = false;
    let tree = parse_listing("R", listing, &settings);

    assert_eq!(
        abs_names(tree.files()),
        vec!["R/a.txt", "R/Dir/x.txt", "R/Dir/y.txt"]
    );
    assert_eq!(tree.find("R/a.txt").unwrap().handle(), Some("1"));
    assert_eq!(tree.find("R/Dir/x.txt").unwrap().handle(), Some("3"));
    assert_eq!(tree.find("R/Dir").unwrap().handle(), Some("d1"));
    assert_eq!(tree.directories().count(), 2);
}

#[test]
fn fragments_ignore_the_root_label() {
    let listing = "\
CS101<H:c>
\tintro.pdf<H:1>
Math<H:m>
\tcalc.pdf<H:2>
";
    let settings = ParseSettings::new(&[".pdf"]).with_allowed_paths(&["CS"]);
    let tree = parse_listing("CS", listing, &settings);

    assert_eq!(abs_names(tree.files()), vec!["CS/CS101/intro.pdf"]);
    assert!(tree.find("CS/Math").is_none());
}

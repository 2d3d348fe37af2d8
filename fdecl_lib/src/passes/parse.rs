use crate::{
    cst::Cst,
    diagnostic::{AggregateResult, DiagnosticBuilder},
    util::Ice,
};
use tree_sitter::{Node, Parser, Tree};

pub fn parse_to_sexp(input: &str) -> AggregateResult<String> {
    parse_to_cst(input).map(|cst| cst.to_sexp())
}

/// Parses `input` with the tree-sitter C grammar.
///
/// tree-sitter always produces a tree, recovering from bad input with `ERROR` and `MISSING`
/// nodes. Each of those becomes an error diagnostic, so a translation unit that doesn't parse
/// cleanly never reaches lowering.
pub fn parse_to_cst(input: &str) -> AggregateResult<Cst<'_>> {
    let tree = parse(input);

    let mut res = AggregateResult::new_ok(());
    collect_syntax_errors(tree.root_node(), input, &mut res);

    log::debug!(
        "parsed {} bytes, {} syntax error(s)",
        input.len(),
        res.diagnostics().count()
    );

    res.map(|_| Cst {
        tree,
        source: input,
    })
}

fn parse(input: &str) -> Tree {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c::LANGUAGE.into())
        .ice();
    // Only `None` without a language, a timeout or a cancellation flag, none of which are set.
    parser.parse(input, None).ice()
}

fn collect_syntax_errors(node: Node<'_>, input: &str, res: &mut AggregateResult<()>) {
    if node.is_missing() {
        res.add_err(DiagnosticBuilder::new(node.byte_range()).build_missing_token(node.kind()));
    } else if node.is_error() {
        let text = node.utf8_text(input.as_bytes()).ice();
        res.add_err(DiagnosticBuilder::new(node.byte_range()).build_syntax_error(text));
    } else if node.has_error() {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            collect_syntax_errors(child, input, res);
        }
    }
}

/// The concrete syntax tree produced by the tree-sitter C grammar, together with the text it was
/// parsed from. Nodes only hold byte offsets, so the text has to travel with the tree.
pub struct Cst<'a> {
    pub(crate) tree: tree_sitter::Tree,
    pub(crate) source: &'a str,
}

impl Cst<'_> {
    pub fn to_sexp(&self) -> String {
        self.tree.root_node().to_sexp()
    }
}

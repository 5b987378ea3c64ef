use super::{CommandTree, NodeId};

impl CommandTree {
    /// Box-drawing view of the tree. Terminal nodes are marked with `*`.
    ///
    /// ```text
    /// give
    /// └── <player:string>
    ///     ├── all *
    ///     └── <item:string> *
    /// ```
    pub fn render(&self) -> String {
        let root = self.node(self.root());
        let mut out = root.argument().name().to_string();
        if root.is_terminal() {
            out.push_str(" *");
        }
        out.push('\n');
        let mut prefix_parts = Vec::new();
        self.render_children(self.root(), &mut prefix_parts, &mut out);
        out
    }

    fn render_children(&self, id: NodeId, prefix_parts: &mut Vec<bool>, out: &mut String) {
        let children = self.node(id).children();
        for (i, child) in children.iter().enumerate() {
            let is_last = i + 1 == children.len();
            let mut prefix = String::new();
            for &has_more in prefix_parts.iter() {
                if has_more {
                    prefix.push_str("│   ");
                } else {
                    prefix.push_str("    ");
                }
            }
            let branch = if is_last { "└── " } else { "├── " };
            let node = self.node(*child);
            let marker = if node.is_terminal() { " *" } else { "" };
            out.push_str(&format!("{}{}{}{}\n", prefix, branch, node.label(), marker));

            prefix_parts.push(!is_last);
            self.render_children(*child, prefix_parts, out);
            prefix_parts.pop();
        }
    }
}

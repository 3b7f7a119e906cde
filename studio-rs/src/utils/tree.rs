//! Tree rendering for model structure

use console::Style;

/// A node in a rendered tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub node_type: NodeType,
    pub children: Vec<TreeNode>,
    pub metadata: Vec<(String, String)>,
    pub external_refs: Vec<ExternalRef>,
}

/// Kinds of nodes in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Root,
    Header,
    Bone,
    Controller,
    Sequence,
    Group,
    Attachment,
}

/// A file the model refers to, such as an external sequence group
#[derive(Debug, Clone)]
pub struct ExternalRef {
    pub path: String,
    pub exists: Option<bool>,
}

/// Options for tree rendering
#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub show_external_refs: bool,
    pub no_color: bool,
    pub show_metadata: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            show_external_refs: true,
            no_color: false,
            show_metadata: true,
        }
    }
}

impl TreeNode {
    /// Create a new tree node
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            children: Vec::new(),
            metadata: Vec::new(),
            external_refs: Vec::new(),
        }
    }

    /// Add a child node
    pub fn add_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Add metadata, kept in insertion order
    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.push((key.to_string(), value.to_string()));
        self
    }

    /// Add an external reference
    pub fn with_external_ref(mut self, path: &str, exists: Option<bool>) -> Self {
        self.external_refs.push(ExternalRef {
            path: path.to_string(),
            exists,
        });
        self
    }
}

impl ExternalRef {
    /// Color style based on existence
    pub fn style(&self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self.exists {
                Some(true) => Style::new().green(),
                Some(false) => Style::new().red(),
                None => Style::new().yellow(),
            }
        }
    }
}

impl NodeType {
    /// Emoji icon for the node type
    pub fn icon(self) -> &'static str {
        match self {
            NodeType::Root => "📁",
            NodeType::Header => "📋",
            NodeType::Bone => "🦴",
            NodeType::Controller => "🎛️",
            NodeType::Sequence => "📽️",
            NodeType::Group => "📦",
            NodeType::Attachment => "📎",
        }
    }

    /// Color style for the node type
    pub fn style(self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self {
                NodeType::Root => Style::new().bold().cyan(),
                NodeType::Header => Style::new().bold().yellow(),
                NodeType::Bone => Style::new().green(),
                NodeType::Controller => Style::new().magenta(),
                NodeType::Sequence => Style::new().blue(),
                NodeType::Group => Style::new().cyan(),
                NodeType::Attachment => Style::new().dim(),
            }
        }
    }
}

/// Render a tree structure to a string
pub fn render_tree(root: &TreeNode, options: &TreeOptions) -> String {
    let mut output = String::new();
    render_node(root, &mut output, "", true, 0, options);
    output
}

fn render_node(
    node: &TreeNode,
    output: &mut String,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &TreeOptions,
) {
    if let Some(max_depth) = options.max_depth
        && depth > max_depth
    {
        return;
    }

    let style = node.node_type.style(options.no_color);
    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };

    output.push_str(&format!(
        "{}{}{} {}\n",
        prefix,
        connector,
        node.node_type.icon(),
        style.apply_to(&node.name)
    ));

    let child_prefix = if depth == 0 {
        String::new()
    } else {
        format!("{}{}", prefix, if is_last { "    " } else { "│   " })
    };

    if options.show_metadata {
        let meta_style = Style::new().dim();
        for (key, value) in &node.metadata {
            output.push_str(&format!(
                "{}    🏷️  {}: {}\n",
                child_prefix,
                meta_style.apply_to(key),
                value
            ));
        }
    }

    if options.show_external_refs {
        for ext_ref in &node.external_refs {
            output.push_str(&format!(
                "{}    └─→ {}\n",
                child_prefix,
                ext_ref.style(options.no_color).apply_to(&ext_ref.path)
            ));
        }
    }

    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == node.children.len() - 1;
        render_node(child, output, &child_prefix, is_last_child, depth + 1, options);
    }
}

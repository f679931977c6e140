//! Python structural analyzer using tree-sitter.

use once_cell::sync::OnceCell;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language as TsLanguage, Node, Parser, Query, QueryCursor, Tree};

use crate::analysis::{count_lines, Strategy, StructuralAnalyzer, StructuralFinding};
use crate::detect::rules;
use crate::language::Language;

/// Function bodies spanning more lines than this are flagged.
pub const MAX_FUNCTION_LINES: usize = 50;

/// Functions declaring more positional parameters than this are flagged.
pub const MAX_POSITIONAL_PARAMS: usize = 5;

const STRUCTURE_QUERY: &str = r#"
(function_definition) @function
(class_definition) @class

(import_statement) @import
(import_from_statement) @import
(future_import_statement) @import

(if_statement) @branch
(elif_clause) @branch
(for_statement) @branch
(while_statement) @branch
(except_clause) @branch

(boolean_operator) @boolean
"#;

/// Raw counts collected from one walk over the tree.
#[derive(Debug, Default)]
struct StructureCounts {
    functions: usize,
    classes: usize,
    imports: usize,
    branches: u32,
    boolean_operands: u32,
    quality_issues: Vec<(usize, String)>,
}

pub struct PythonAnalyzer {
    language: TsLanguage,
    /// Compiled on first use and shared by every worker.
    query: OnceCell<Query>,
}

impl PythonAnalyzer {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
            query: OnceCell::new(),
        }
    }

    fn parse(&self, source: &[u8]) -> anyhow::Result<Tree> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("parser produced no tree"))
    }

    fn collect(&self, tree: &Tree, source: &[u8]) -> anyhow::Result<StructureCounts> {
        let query = self
            .query
            .get_or_try_init(|| Query::new(&self.language, STRUCTURE_QUERY))?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, tree.root_node(), source);

        let mut counts = StructureCounts::default();

        while let Some(m) = matches.next() {
            for capture in m.captures {
                let node = capture.node;
                match query.capture_names()[capture.index as usize] {
                    "function" => {
                        counts.functions += 1;
                        let start = node.start_byte();
                        counts.quality_issues.extend(
                            function_issues(node, source)
                                .into_iter()
                                .map(|issue| (start, issue)),
                        );
                    }
                    "class" => counts.classes += 1,
                    "import" => counts.imports += 1,
                    "branch" => counts.branches += 1,
                    "boolean" => {
                        if is_chain_root(node) {
                            counts.boolean_operands += chain_operand_count(node) - 1;
                        }
                    }
                    _ => {}
                }
            }
        }

        counts.quality_issues.sort_by_key(|(pos, _)| *pos);
        Ok(counts)
    }

    fn try_analyze(&self, filename: &str, content: &str) -> anyhow::Result<StructuralFinding> {
        let source = content.as_bytes();
        let tree = self.parse(source)?;

        let root = tree.root_node();
        if let Some(message) = first_syntax_error(root).or_else(|| first_legacy_statement(root)) {
            return Ok(StructuralFinding::unparsed(
                filename,
                Language::Python.as_str(),
                format!("Syntax error: {}", message),
            ));
        }

        let counts = self.collect(&tree, source)?;

        Ok(StructuralFinding {
            filename: filename.to_string(),
            language: Language::Python.as_str().to_string(),
            function_count: counts.functions,
            class_count: counts.classes,
            import_count: counts.imports,
            complexity_score: 1 + counts.branches + counts.boolean_operands,
            lines_of_code: count_lines(content),
            quality_issues: counts.quality_issues.into_iter().map(|(_, i)| i).collect(),
            security_patterns: rules::security_hints(Language::Python.family(), content),
            parsed: true,
            error: None,
        })
    }
}

impl Default for PythonAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuralAnalyzer for PythonAnalyzer {
    fn strategy(&self) -> Strategy {
        Strategy::Exact
    }

    fn analyze(&self, filename: &str, _language: Language, content: &str) -> StructuralFinding {
        match self.try_analyze(filename, content) {
            Ok(finding) => finding,
            Err(e) => {
                tracing::debug!(file = filename, error = %e, "python analysis failed");
                StructuralFinding::unparsed(
                    filename,
                    Language::Python.as_str(),
                    format!("Parse error: {}", e),
                )
            }
        }
    }
}

/// Locate the first ERROR or MISSING node in document order.
fn first_syntax_error(root: Node) -> Option<String> {
    if !root.has_error() {
        return None;
    }

    let mut cursor = root.walk();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let pos = node.start_position();
        if node.is_missing() {
            return Some(format!(
                "missing '{}' at line {}, column {}",
                node.kind(),
                pos.row + 1,
                pos.column + 1
            ));
        }
        if node.is_error() {
            return Some(format!(
                "invalid syntax at line {}, column {}",
                pos.row + 1,
                pos.column + 1
            ));
        }
        if node.has_error() {
            let children: Vec<Node> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }

    // has_error() was true but no node was flagged; report the root.
    Some("invalid syntax".to_string())
}

/// Python 2 statement forms the grammar still accepts but Python 3 rejects.
const LEGACY_STATEMENTS: &[&str] = &["print_statement", "exec_statement"];

/// Locate the first Python 2 only statement in document order.
fn first_legacy_statement(root: Node) -> Option<String> {
    let mut cursor = root.walk();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if LEGACY_STATEMENTS.contains(&node.kind()) {
            let pos = node.start_position();
            return Some(format!(
                "invalid syntax at line {}, column {}",
                pos.row + 1,
                pos.column + 1
            ));
        }
        let children: Vec<Node> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

/// Quality issues for a single function definition.
fn function_issues(func: Node, source: &[u8]) -> Vec<String> {
    let name = func
        .child_by_field_name("name")
        .and_then(|n| n.utf8_text(source).ok())
        .unwrap_or("<anonymous>");

    let mut issues = Vec::new();

    let length = last_row(func) - func.start_position().row;
    if length > MAX_FUNCTION_LINES {
        issues.push(format!("Function '{}' is very long ({} lines)", name, length));
    }

    let params = func
        .child_by_field_name("parameters")
        .map(positional_parameter_count)
        .unwrap_or(0);
    if params > MAX_POSITIONAL_PARAMS {
        issues.push(format!(
            "Function '{}' has too many parameters ({})",
            name, params
        ));
    }

    issues
}

/// Row of the last character belonging to the node.
fn last_row(node: Node) -> usize {
    let end = node.end_position();
    if end.column == 0 && end.row > node.start_position().row {
        end.row - 1
    } else {
        end.row
    }
}

/// Count parameters preceding any `*`, `*args` or `**kwargs`.
fn positional_parameter_count(params: Node) -> usize {
    let mut count = 0;
    let mut cursor = params.walk();
    for child in params.named_children(&mut cursor) {
        match child.kind() {
            "identifier" | "default_parameter" | "typed_default_parameter" => count += 1,
            "typed_parameter" => {
                let splat = child
                    .named_child(0)
                    .map(|n| matches!(n.kind(), "list_splat_pattern" | "dictionary_splat_pattern"))
                    .unwrap_or(false);
                if splat {
                    break;
                }
                count += 1;
            }
            "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" => break,
            _ => {}
        }
    }
    count
}

fn boolean_operator_kind(node: Node) -> Option<&'static str> {
    if node.kind() != "boolean_operator" {
        return None;
    }
    node.child_by_field_name("operator").map(|op| op.kind())
}

/// A chain root is a boolean operator not nested directly inside an
/// operator of the same kind.
fn is_chain_root(node: Node) -> bool {
    let op = boolean_operator_kind(node);
    match node.parent() {
        Some(parent) => boolean_operator_kind(parent) != op,
        None => true,
    }
}

/// Number of operands in a flattened same-operator chain.
fn chain_operand_count(node: Node) -> u32 {
    let op = boolean_operator_kind(node);
    let mut operands = 0;
    for field in ["left", "right"] {
        match node.child_by_field_name(field) {
            Some(child) if boolean_operator_kind(child) == op => {
                operands += chain_operand_count(child);
            }
            Some(_) => operands += 1,
            None => {}
        }
    }
    operands.max(2)
}

//! Inspect report types and terminal formatting.

use std::fmt;

use serde::Serialize;

use crate::model::ObjectKind;

/// The result of inspecting a taxonomy model.
#[derive(Clone, Debug, Serialize)]
pub struct InspectReport {
    /// Summary counts for the model.
    pub summary: SummarySection,
    /// Live objects per kind, in kind declaration order.
    pub kinds: Vec<KindCount>,
    /// One entry per base network or domain.
    pub graphs: Vec<GraphSummary>,
}

/// Summary counts for the model.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SummarySection {
    /// Names of the loaded taxonomies in load order, without the core vocabulary.
    pub taxonomies: Vec<String>,
    /// Live objects, excluding tombstoned duplicates.
    pub objects: usize,
    /// Entries in the named-object registry.
    pub registry_len: usize,
    /// Distinct names with tagged objects attached.
    pub tag_index_len: usize,
    pub facts: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct KindCount {
    pub kind: ObjectKind,
    pub count: usize,
}

/// Shape of one network or domain, extensions included.
#[derive(Clone, Debug, Serialize)]
pub struct GraphSummary {
    pub kind: ObjectKind,
    pub name: String,
    pub relationship_type: Option<String>,
    pub roots: Vec<String>,
    pub edges: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree: Option<String>,
}

const WIDTH: usize = 59;

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "╭─────────────────────────────────────────────────────────────╮")?;
        writeln!(f, "│              📊  Taxonomy Inspection Report                 │")?;
        writeln!(f, "╰─────────────────────────────────────────────────────────────╯")?;
        writeln!(f)?;

        self.fmt_summary(f)?;
        writeln!(f)?;

        self.fmt_kinds(f)?;
        writeln!(f)?;

        self.fmt_graphs(f)?;

        Ok(())
    }
}

impl InspectReport {
    fn fmt_summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;

        section_header(f, "Summary")?;
        blank_line(f)?;
        if s.taxonomies.is_empty() {
            boxed_line(f, "  Taxonomies:     (none)")?;
        } else {
            for (i, name) in s.taxonomies.iter().enumerate() {
                let heading = if i == 0 { "Taxonomies:" } else { "" };
                boxed_line(f, &format!("  {:<15} {}", heading, name))?;
            }
        }
        boxed_line(f, &format!("  Objects:        {:>8}", format_number(s.objects)))?;
        boxed_line(f, &format!("  Named:          {:>8}", format_number(s.registry_len)))?;
        boxed_line(f, &format!("  Tagged names:   {:>8}", format_number(s.tag_index_len)))?;
        if s.facts > 0 {
            boxed_line(f, &format!("  Facts:          {:>8}", format_number(s.facts)))?;
        }
        blank_line(f)?;
        section_footer(f)
    }

    fn fmt_kinds(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        section_header(f, &format!("Objects ({} kinds)", self.kinds.len()))?;
        blank_line(f)?;
        for entry in &self.kinds {
            boxed_line(
                f,
                &format!("  {:<28} {:>8}", entry.kind.name(), format_number(entry.count)),
            )?;
        }
        blank_line(f)?;
        section_footer(f)
    }

    fn fmt_graphs(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        section_header(f, "Networks and Domains")?;
        blank_line(f)?;

        if self.graphs.is_empty() {
            boxed_line(f, "  No networks or domains found.")?;
        }
        for graph in &self.graphs {
            boxed_line(f, &format!("  {} {}", graph.kind, truncate(&graph.name, 44)))?;
            if let Some(rel_type) = &graph.relationship_type {
                boxed_line(f, &format!("    type:  {}", truncate(rel_type, 46)))?;
            }
            boxed_line(f, &format!("    edges: {}", format_number(graph.edges)))?;
            let roots = if graph.roots.is_empty() {
                "(none)".to_string()
            } else {
                graph.roots.join(", ")
            };
            boxed_line(f, &format!("    roots: {}", truncate(&roots, 46)))?;
            if let Some(tree) = &graph.tree {
                for line in tree.lines() {
                    boxed_line(f, &format!("      {}", truncate(line, 51)))?;
                }
            }
            blank_line(f)?;
        }

        section_footer(f)
    }
}

fn section_header(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    let fill = (WIDTH - 3).saturating_sub(title.chars().count());
    writeln!(f, "┌─ {} {}┐", title, "─".repeat(fill))
}

fn section_footer(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "└{}┘", "─".repeat(WIDTH))
}

fn blank_line(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "│{}│", " ".repeat(WIDTH))
}

/// One line of box content, padded to the box width.
fn boxed_line(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    let padding = WIDTH.saturating_sub(text.chars().count() + 1);
    writeln!(f, "│ {}{}│", text, " ".repeat(padding))
}

/// Format a number with thousands separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Truncate to `max_len` characters, marking the cut with an ellipsis.
fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len - 1).collect();
        format!("{}…", kept)
    }
}

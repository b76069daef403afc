//! ER diagram rendering via Graphviz
//!
//! The schema is written as an undirected DOT graph laid out left-to-right,
//! one plaintext node per table with an HTML-like label listing its columns,
//! and one dashed edge per foreign key. `dot -Tpdf` turns it into a PDF.

use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;

use crate::engine::{ForeignKeyInfo, SchemaInfo, TableInfo};
use crate::error::{AutodocError, Result};
use crate::tools::{launch_error, ToolCommand, GRAPHVIZ_PACKAGE};

const GRAPH_HEADER: &str = r#"graph {
   graph [rankdir=LR, nodesep=1.0, ranksep=1.0, pad="0.5"];
   node [label="\N", shape=plaintext];
   edge [color=gray50, minlen=2, style=dashed];
"#;

/// Generate the DOT source for `schema`
///
/// Foreign keys pointing at tables outside `schema` (e.g. excluded ones) are
/// not drawn.
#[must_use]
pub fn to_dot(schema: &SchemaInfo) -> String {
    let mut output = String::from(GRAPH_HEADER);

    for table in &schema.tables {
        let node = format!("\n  {} [label=<{}>];", quote_id(&table.name), table_label(table));
        output.push_str(&node);
    }

    output.push('\n');

    for table in &schema.tables {
        for fk in &table.foreign_keys {
            if !schema.contains_table(&fk.referenced_table) {
                continue;
            }
            output.push_str(&format!(
                "\n  {} -- {} [taillabel=<<FONT>0..N</FONT>>, headlabel=<<FONT>{}</FONT>>];",
                quote_id(&table.name),
                quote_id(&fk.referenced_table),
                referenced_cardinality(table, fk)
            ));
        }
    }

    output.push_str("\n}\n");
    output
}

/// `1` when every local FK column is NOT NULL, `0..1` otherwise
fn referenced_cardinality(table: &TableInfo, fk: &ForeignKeyInfo) -> &'static str {
    let optional = fk.columns.iter().any(|name| {
        table.columns.iter().find(|c| &c.name == name).map_or(true, |c| c.nullable)
    });
    if optional {
        "0..1"
    } else {
        "1"
    }
}

fn table_label(table: &TableInfo) -> String {
    let mut html = String::from(
        r#"<FONT FACE="Helvetica"><TABLE BORDER="0" CELLBORDER="1" CELLPADDING="4" CELLSPACING="0">"#,
    );

    html.push_str(&format!(
        r#"<TR><TD><B><FONT POINT-SIZE="16">{}</FONT></B></TD></TR>"#,
        escape_html(&table.name)
    ));

    for column in &table.columns {
        let name = escape_html(&column.name);
        let name = if column.primary_key { format!("<U>{name}</U>") } else { name };
        html.push_str(&format!(
            r##"<TR><TD ALIGN="LEFT" BORDER="0"><FONT>{name}</FONT><FONT COLOR="#555555"> [{}]</FONT></TD></TR>"##,
            escape_html(&column.data_type)
        ));
    }

    html.push_str("</TABLE></FONT>");
    html
}

/// Escape a string for use in DOT HTML labels
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

/// Quote a string for use as a DOT node ID
fn quote_id(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Render the ER diagram for `schema` to a PDF at `output_path`
pub async fn render_pdf(schema: &SchemaInfo, tool: &ToolCommand, output_path: &Path) -> Result<()> {
    tracing::info!(tables = schema.tables.len(), "Generating ER diagram PDF");
    let dot_source = to_dot(schema);

    let mut child = tool
        .command()
        .arg("-Tpdf")
        .arg("-o")
        .arg(output_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| launch_error(tool, GRAPHVIZ_PACKAGE, e))?;

    // Fed from its own task so stderr keeps draining while dot reads its input
    let stdin = child.stdin.take();
    let writer = tokio::spawn(async move {
        match stdin {
            // Dropping stdin closes the pipe so dot can finish
            Some(mut stdin) => stdin.write_all(dot_source.as_bytes()).await,
            None => Ok(()),
        }
    });

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AutodocError::tool_failed(
            tool.program(),
            format!("{} {}", output.status, stderr.trim()).trim_end().to_string(),
        ));
    }

    writer.await.map_err(|e| {
        AutodocError::tool_failed(tool.program(), format!("Writing DOT input failed: {e}"))
    })??;

    if !output_path.exists() {
        return Err(AutodocError::OutputMissing(output_path.to_path_buf()));
    }

    tracing::info!(path = %output_path.display(), "ER diagram PDF created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ColumnInfo;
    use std::time::Duration;

    fn schema() -> SchemaInfo {
        SchemaInfo::new(vec![
            TableInfo {
                name: "customers".to_string(),
                columns: vec![ColumnInfo {
                    name: "id".to_string(),
                    data_type: "integer".to_string(),
                    primary_key: true,
                    ..Default::default()
                }],
                primary_key: vec!["id".to_string()],
                ..Default::default()
            },
            TableInfo {
                name: "orders".to_string(),
                columns: vec![
                    ColumnInfo {
                        name: "id".to_string(),
                        data_type: "integer".to_string(),
                        primary_key: true,
                        ..Default::default()
                    },
                    ColumnInfo {
                        name: "customer_id".to_string(),
                        data_type: "integer".to_string(),
                        nullable: false,
                        ..Default::default()
                    },
                    ColumnInfo {
                        name: "coupon_id".to_string(),
                        data_type: "integer".to_string(),
                        nullable: true,
                        ..Default::default()
                    },
                ],
                foreign_keys: vec![
                    ForeignKeyInfo {
                        name: "fk_customer".to_string(),
                        columns: vec!["customer_id".to_string()],
                        referenced_table: "customers".to_string(),
                        referenced_columns: vec!["id".to_string()],
                    },
                    ForeignKeyInfo {
                        name: "fk_coupon".to_string(),
                        columns: vec!["coupon_id".to_string()],
                        referenced_table: "coupons".to_string(),
                        referenced_columns: vec!["id".to_string()],
                    },
                ],
                ..Default::default()
            },
        ])
    }

    #[test]
    fn test_dot_layout_attributes() {
        let dot = to_dot(&schema());
        assert!(dot.starts_with("graph {"));
        assert!(dot.contains("rankdir=LR"));
        assert!(dot.contains("style=dashed"));
        assert!(dot.contains("minlen=2"));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn test_dot_nodes_and_edges() {
        let dot = to_dot(&schema());
        assert!(dot.contains(r#""customers" [label=<"#));
        assert!(dot.contains(r#""orders" [label=<"#));
        assert!(dot.contains("<U>id</U>"));
        assert!(dot.contains("customer_id</FONT>"));
        assert!(dot.contains(
            r#""orders" -- "customers" [taillabel=<<FONT>0..N</FONT>>, headlabel=<<FONT>1</FONT>>];"#
        ));
    }

    #[test]
    fn test_dot_skips_edges_to_missing_tables() {
        let dot = to_dot(&schema());
        assert!(!dot.contains("coupons"));
    }

    #[test]
    fn test_nullable_fk_is_optional() {
        let mut schema = schema();
        schema.tables[1].foreign_keys[0].columns = vec!["coupon_id".to_string()];
        let dot = to_dot(&schema);
        assert!(dot.contains("headlabel=<<FONT>0..1</FONT>>"));
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_html("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
        assert_eq!(quote_id("we\"ird"), "\"we\\\"ird\"");
    }

    #[tokio::test]
    async fn test_render_missing_graphviz() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("er.pdf");
        let tool = ToolCommand::new("autodoc-test-missing-dot");

        let err = render_pdf(&schema(), &tool, &output).await.unwrap_err();
        assert!(err.message().contains("Please install Graphviz"));
        assert!(!output.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_render_pipes_dot_source() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("er.pdf");
        // $1 = -Tpdf, $2 = -o, $3 = output path
        let tool = ToolCommand::new("sh").with_args(["-c", r#"cat > "$3""#, "dot"]);

        render_pdf(&schema(), &tool, &output).await.unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written, to_dot(&schema()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_render_with_chatty_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("er.pdf");
        // Fills the stderr pipe well past its buffer before touching stdin
        let script = r#"head -c 200000 /dev/zero >&2; cat > "$3""#;
        let tool = ToolCommand::new("sh").with_args(["-c", script, "dot"]);

        let rendered =
            tokio::time::timeout(Duration::from_secs(30), render_pdf(&schema(), &tool, &output))
                .await
                .expect("render_pdf stalled");

        rendered.unwrap();
        assert_eq!(std::fs::read_to_string(&output).unwrap(), to_dot(&schema()));
    }
}

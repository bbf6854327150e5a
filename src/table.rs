//! Read-only table of the current batch list.

use crate::html::{attr, escape, Nav};
use crate::model::{BatchEntry, EntryKey};
use crate::schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Enabled,
    Disabled,
}

impl Badge {
    pub fn label(&self) -> &'static str {
        match self {
            Badge::Enabled => "Enabled",
            Badge::Disabled => "Disabled",
        }
    }

    fn class(&self) -> &'static str {
        match self {
            Badge::Enabled => "badge",
            Badge::Disabled => "badge outline",
        }
    }
}

/// What the operator asked for from a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableIntent {
    Edit(EntryKey),
    Delete(EntryKey),
}

impl TableIntent {
    pub fn path(&self) -> String {
        match self {
            TableIntent::Edit(key) => format!("/batches/{}/edit", key),
            TableIntent::Delete(key) => format!("/batches/{}/delete", key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub key: EntryKey,
    pub job_name: String,
    pub cron_expression: String,
    pub target_url: String,
    pub badge: Badge,
    pub next_run: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTable {
    rows: Vec<TableRow>,
    busy: bool,
}

impl BatchTable {
    /// `busy` disables the row actions.
    pub fn new(entries: &[BatchEntry], busy: bool) -> Self {
        let rows = entries
            .iter()
            .map(|e| TableRow {
                key: e.key.clone(),
                job_name: e.record.job_name.clone(),
                cron_expression: e.record.cron_expression.clone(),
                target_url: e.record.target_url.clone(),
                badge: if e.record.enabled {
                    Badge::Enabled
                } else {
                    Badge::Disabled
                },
                next_run: schema::next_run(&e.record.cron_expression)
                    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string()),
            })
            .collect();
        Self { rows, busy }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn render(&self, nav: &Nav) -> String {
        let mut body = String::new();
        for r in &self.rows {
            let cron_title = r
                .next_run
                .as_deref()
                .map(|t| format!(" title=\"next run {}\"", attr(t)))
                .unwrap_or_default();
            body.push_str(&format!(
                "<tr data-key=\"{}\"><td>{}</td><td{}>{}</td><td>{}</td><td><span class=\"{}\">{}</span></td><td class=\"actions\">{}{}</td></tr>\n",
                attr(&r.key.to_string()),
                escape(&r.job_name),
                cron_title,
                escape(&r.cron_expression),
                escape(&r.target_url),
                r.badge.class(),
                r.badge.label(),
                self.action(nav, &TableIntent::Edit(r.key.clone()), "Edit"),
                self.action(nav, &TableIntent::Delete(r.key.clone()), "Delete"),
            ));
        }

        format!(
            r#"<table>
  <thead>
    <tr><th>Job Name</th><th>Cron Expression</th><th>Target URL</th><th>Enabled</th><th class="actions">Actions</th></tr>
  </thead>
  <tbody>
{}  </tbody>
</table>"#,
            body
        )
    }

    fn action(&self, nav: &Nav, intent: &TableIntent, label: &str) -> String {
        if self.busy {
            format!(
                "<span class=\"button ghost\" aria-disabled=\"true\">{}</span>",
                label
            )
        } else {
            format!(
                "<a class=\"button ghost\" href=\"{}\">{}</a>",
                nav.href(&intent.path()),
                label
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BatchRecord;

    fn entry(id: i64, name: &str, enabled: bool) -> BatchEntry {
        BatchEntry {
            key: EntryKey::Server(id),
            record: BatchRecord {
                id: Some(id),
                job_name: name.into(),
                cron_expression: "0 0 * * *".into(),
                target_url: "https://x.example/hook".into(),
                enabled,
            },
        }
    }

    #[test]
    fn rows_carry_badges() {
        let table = BatchTable::new(&[entry(1, "a", true), entry(2, "b", false)], false);
        assert_eq!(table.rows().len(), 2);
        assert_eq!(table.rows()[0].badge.label(), "Enabled");
        assert_eq!(table.rows()[1].badge.label(), "Disabled");
        assert!(table.rows()[0].next_run.is_some());
    }

    #[test]
    fn render_escapes_and_links_intents() {
        let table = BatchTable::new(&[entry(7, "<script>", true)], false);
        let html = table.render(&Nav::new("tok"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("href=\"/batches/s7/edit?token=tok\""));
        assert!(html.contains("href=\"/batches/s7/delete?token=tok\""));
        assert!(html.contains(">Enabled</span>"));
    }

    #[test]
    fn busy_table_disables_actions() {
        let table = BatchTable::new(&[entry(7, "a", true)], true);
        let html = table.render(&Nav::new("tok"));
        assert!(!html.contains("href="));
        assert!(html.contains("aria-disabled=\"true\""));
    }
}

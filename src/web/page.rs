//! Server-rendered pages.

use crate::console::Console;
use crate::form::{FormController, FormMode};
use crate::html::{attr, escape, Nav};
use crate::model::{BatchEntry, Field};
use crate::table::BatchTable;

const STYLE: &str = r#"
:root { color-scheme: light dark; --fg: #222; --muted: #666; --accent: #2563eb; --danger: #dc2626; }
body { font-family: system-ui, sans-serif; margin: 0; padding: 1rem; color: var(--fg); }
.card { border: 1px solid #ddd; border-radius: .5rem; padding: 1rem; }
.card header { display: flex; justify-content: space-between; align-items: center; }
.toolbar { display: flex; gap: .5rem; align-items: center; }
table { width: 100%; border-collapse: collapse; margin-top: 1rem; }
th, td { text-align: left; padding: .5rem; border-bottom: 1px solid #eee; }
.actions { text-align: right; }
.badge { padding: .1rem .5rem; border-radius: 999px; background: var(--accent); color: #fff; font-size: .8rem; }
.badge.outline { background: none; color: var(--muted); border: 1px solid var(--muted); }
.button { padding: .4rem .8rem; border-radius: .4rem; border: 1px solid #ccc; background: none; text-decoration: none; color: inherit; cursor: pointer; }
.button.primary { background: var(--accent); color: #fff; border-color: var(--accent); }
.button.destructive { background: var(--danger); color: #fff; border-color: var(--danger); }
.button.ghost { border-color: transparent; }
[aria-disabled="true"], button:disabled { opacity: .5; cursor: not-allowed; }
.dialog { border: 1px solid #ccc; border-radius: .5rem; padding: 1rem; margin-top: 1rem; display: grid; gap: 1rem; max-width: 32rem; }
.error { color: var(--danger); font-size: .85rem; margin: .25rem 0 0; }
.notice { color: var(--danger); margin-top: 1rem; }
.denied { display: flex; min-height: 100vh; justify-content: center; align-items: center; color: var(--danger); font-size: 6rem; }
"#;

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{}</title>
    <style>{}</style>
  </head>
  <body>
{}
  </body>
</html>"#,
        escape(title),
        STYLE,
        body
    )
}

pub fn permission_denied() -> String {
    layout(
        "Permission Denied",
        r#"<div class="denied">Permission Denied</div>"#,
    )
}

pub fn management(console: &Console, nav: &Nav) -> String {
    let busy = console.is_busy();
    let disabled = if busy { " disabled" } else { "" };

    let add_button = if busy || console.form().is_saving() {
        r#"<span class="button primary" aria-disabled="true">+ Add Batch</span>"#.to_string()
    } else {
        format!(
            r#"<a class="button primary" href="{}">+ Add Batch</a>"#,
            nav.href("/batches/new")
        )
    };
    let refresh_label = if console.store().is_loading() {
        "Refreshing..."
    } else {
        "Refresh"
    };

    let mut body = format!(
        r#"<div class="card">
  <header>
    <h1>Batch Management</h1>
    <div class="toolbar">
      <form method="post" action="{}"><button class="button" type="submit"{}>{}</button></form>
      {}
    </div>
  </header>
"#,
        nav.href("/refresh"),
        disabled,
        refresh_label,
        add_button
    );

    if let Some(notice) = console.notice() {
        body.push_str(&format!(
            "  <p class=\"notice\" role=\"status\">{}</p>\n",
            escape(notice)
        ));
    }
    if console.form().is_open() {
        body.push_str(&form_dialog(console.form(), nav));
    }
    body.push_str(&BatchTable::new(console.store().entries(), busy).render(nav));
    body.push_str("\n</div>\n");

    if let Some(entry) = console.pending_delete() {
        body.push_str(&delete_dialog(entry, console.is_deleting(), nav));
    }

    layout("Batch Management", &body)
}

fn form_dialog(form: &FormController, nav: &Nav) -> String {
    let disabled = if form.is_saving() { " disabled" } else { "" };
    let draft = form.draft();
    let error = |field: Field| {
        form.errors()
            .get(field)
            .map(|m| format!("<p class=\"error\">{}</p>", escape(m)))
            .unwrap_or_default()
    };
    let title = match form.mode() {
        FormMode::Edit { .. } => "Edit Batch",
        _ => "New Batch",
    };

    format!(
        r#"  <section class="dialog" aria-label="{title}">
    <form method="post" action="{action}" class="dialog">
      <div>
        <input name="jobName" placeholder="Job Name" value="{job_name}"{disabled}>
        {job_name_error}
      </div>
      <div>
        <input name="cronExpression" placeholder="Cron Expression" value="{cron}"{disabled}>
        {cron_error}
      </div>
      <div>
        <input name="targetUrl" placeholder="Target URL" value="{url}"{disabled}>
        {url_error}
      </div>
      <div>
        <input type="checkbox" id="enabled" name="enabled" value="on"{checked}{disabled}>
        <label for="enabled">Enabled</label>
      </div>
      <div class="toolbar">
        <button class="button" type="submit" formaction="{cancel}"{disabled}>Cancel</button>
        <button class="button primary" type="submit"{disabled}>{label}</button>
      </div>
    </form>
  </section>
"#,
        title = title,
        action = nav.href("/batches/form"),
        cancel = nav.href("/batches/form/cancel"),
        job_name = attr(&draft.job_name),
        cron = attr(&draft.cron_expression),
        url = attr(&draft.target_url),
        checked = if draft.enabled { " checked" } else { "" },
        disabled = disabled,
        job_name_error = error(Field::JobName),
        cron_error = error(Field::CronExpression),
        url_error = error(Field::TargetUrl),
        label = form.submit_label(),
    )
}

fn delete_dialog(entry: &BatchEntry, deleting: bool, nav: &Nav) -> String {
    let disabled = if deleting { " disabled" } else { "" };
    let path = format!("/batches/{}/delete", entry.key);
    format!(
        r#"<section class="dialog" role="alertdialog">
  <div>Are you sure you want to delete <strong>{name}</strong>?</div>
  <div class="toolbar">
    <form method="post" action="{cancel}"><button class="button" type="submit"{disabled}>Cancel</button></form>
    <form method="post" action="{action}"><button class="button destructive" type="submit"{disabled}>{label}</button></form>
  </div>
</section>
"#,
        name = escape(&entry.record.job_name),
        cancel = nav.href("/batches/delete/cancel"),
        action = nav.href(&path),
        disabled = disabled,
        label = if deleting { "Deleting..." } else { "Delete" },
    )
}

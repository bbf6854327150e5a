use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Html,
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::console::{Console, DeleteError};
use crate::form::FormError;
use crate::html::Nav;
use crate::model::{EntryKey, FieldValue};
use crate::web::error::AppError;
use crate::web::{page, AppState};

type Page = (StatusCode, Html<String>);

fn render(console: &Console, nav: &Nav, status: StatusCode) -> Page {
    (status, Html(page::management(console, nav)))
}

fn parse_key(raw: &str) -> Result<EntryKey, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("batch {}", raw)))
}

/// Fetch the list without holding the console lock across the call.
async fn refresh_list(state: &AppState) {
    let ticket = state.console.lock().await.begin_refresh();
    let result = state.api.list().await;
    if let Err(err) = state.console.lock().await.finish_refresh(ticket, result) {
        debug!(%err, "list refresh did not replace entries");
    }
}

#[instrument(skip_all)]
pub async fn index(State(state): State<Arc<AppState>>, Extension(nav): Extension<Nav>) -> Page {
    refresh_list(&state).await;
    let console = state.console.lock().await;
    render(&console, &nav, StatusCode::OK)
}

#[instrument(skip_all)]
pub async fn refresh(State(state): State<Arc<AppState>>, Extension(nav): Extension<Nav>) -> Page {
    refresh_list(&state).await;
    let console = state.console.lock().await;
    render(&console, &nav, StatusCode::OK)
}

pub async fn new_batch(State(state): State<Arc<AppState>>, Extension(nav): Extension<Nav>) -> Page {
    let mut console = state.console.lock().await;
    let status = if console.open_create() {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    render(&console, &nav, status)
}

pub async fn edit_batch(
    State(state): State<Arc<AppState>>,
    Extension(nav): Extension<Nav>,
    Path(key): Path<String>,
) -> Result<Page, AppError> {
    let key = parse_key(&key)?;
    let mut console = state.console.lock().await;
    if console.store().find(&key).is_none() {
        return Err(AppError::NotFound(format!("batch {}", key)));
    }
    let status = if console.open_edit(&key) {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    Ok(render(&console, &nav, status))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInput {
    #[serde(default)]
    job_name: String,
    #[serde(default)]
    cron_expression: String,
    #[serde(default)]
    target_url: String,
    // Unchecked checkboxes are absent from the body.
    enabled: Option<String>,
}

#[instrument(skip_all)]
pub async fn submit_form(
    State(state): State<Arc<AppState>>,
    Extension(nav): Extension<Nav>,
    Form(input): Form<FormInput>,
) -> Page {
    let request = {
        let mut console = state.console.lock().await;
        if console.form().is_open() {
            console.change_field(FieldValue::JobName(input.job_name));
            console.change_field(FieldValue::CronExpression(input.cron_expression));
            console.change_field(FieldValue::TargetUrl(input.target_url));
            console.change_field(FieldValue::Enabled(input.enabled.is_some()));
        }
        match console.begin_save() {
            Ok(request) => request,
            Err(FormError::Invalid(_)) => {
                return render(&console, &nav, StatusCode::UNPROCESSABLE_ENTITY)
            }
            Err(FormError::Busy) => return render(&console, &nav, StatusCode::CONFLICT),
            Err(FormError::Closed) => return render(&console, &nav, StatusCode::BAD_REQUEST),
            Err(err) => {
                console.set_notice(err.to_string());
                return render(&console, &nav, StatusCode::BAD_REQUEST);
            }
        }
    };

    let result = request.send(state.api.as_ref()).await;
    let saved = state.console.lock().await.finish_save(result);
    if saved.is_err() {
        let console = state.console.lock().await;
        return render(&console, &nav, StatusCode::BAD_GATEWAY);
    }

    refresh_list(&state).await;
    let console = state.console.lock().await;
    render(&console, &nav, StatusCode::OK)
}

pub async fn cancel_form(State(state): State<Arc<AppState>>, Extension(nav): Extension<Nav>) -> Page {
    let mut console = state.console.lock().await;
    let status = if console.cancel_form() {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    render(&console, &nav, status)
}

pub async fn confirm_delete(
    State(state): State<Arc<AppState>>,
    Extension(nav): Extension<Nav>,
    Path(key): Path<String>,
) -> Result<Page, AppError> {
    let key = parse_key(&key)?;
    let mut console = state.console.lock().await;
    if console.store().find(&key).is_none() {
        return Err(AppError::NotFound(format!("batch {}", key)));
    }
    let status = if console.request_delete(&key) {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    Ok(render(&console, &nav, status))
}

#[instrument(skip_all)]
pub async fn delete_batch(
    State(state): State<Arc<AppState>>,
    Extension(nav): Extension<Nav>,
    Path(key): Path<String>,
) -> Result<Page, AppError> {
    let key = parse_key(&key)?;
    let id = {
        let mut console = state.console.lock().await;
        if console.pending_delete().map(|e| &e.key) != Some(&key) {
            return Err(AppError::InvalidInput(format!(
                "delete of {} was not confirmed",
                key
            )));
        }
        match console.begin_delete() {
            Ok(id) => id,
            Err(DeleteError::Busy) => return Ok(render(&console, &nav, StatusCode::CONFLICT)),
            Err(err) => {
                console.set_notice(err.to_string());
                return Ok(render(&console, &nav, StatusCode::BAD_REQUEST));
            }
        }
    };

    let result = state.api.delete(id).await;
    let deleted = state.console.lock().await.finish_delete(id, result);
    if deleted.is_err() {
        let console = state.console.lock().await;
        return Ok(render(&console, &nav, StatusCode::BAD_GATEWAY));
    }

    refresh_list(&state).await;
    let console = state.console.lock().await;
    Ok(render(&console, &nav, StatusCode::OK))
}

pub async fn cancel_delete(State(state): State<Arc<AppState>>, Extension(nav): Extension<Nav>) -> Page {
    let mut console = state.console.lock().await;
    let status = if console.dismiss_delete() {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    render(&console, &nav, status)
}

pub async fn permission_denied() -> Html<String> {
    Html(page::permission_denied())
}

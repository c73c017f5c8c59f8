use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// `POST /ask`: answer a question about the indexed codebase.
///
/// A missing or null `question` is treated like an empty one; numbers and
/// booleans are taken as their text.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!("Rejected /ask body: {}", rejection);
        ApiError::BadRequest("Request body must be a JSON object.".to_string())
    })?;
    let question = question_text(&payload)?;
    let span = tracing::info_span!("ask", request_id = %Uuid::new_v4());

    async move {
        tracing::info!("Question received ({} chars)", question.chars().count());
        let answer = state.query.ask(&question).await?;
        tracing::info!("Answer generated ({} chars)", answer.chars().count());
        Ok::<_, ApiError>(Json(AskResponse { answer }))
    }
    .instrument(span)
    .await
}

fn question_text(payload: &Value) -> Result<String, ApiError> {
    let Some(body) = payload.as_object() else {
        return Err(ApiError::BadRequest(
            "Request body must be a JSON object.".to_string(),
        ));
    };
    match body.get("question") {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(Value::Bool(flag)) => Ok(flag.to_string()),
        Some(_) => Err(ApiError::BadRequest(
            "Question must be a string.".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_questions_become_text() {
        assert_eq!(question_text(&json!({ "question": "why?" })).unwrap(), "why?");
        assert_eq!(question_text(&json!({ "question": 42 })).unwrap(), "42");
        assert_eq!(question_text(&json!({ "question": true })).unwrap(), "true");
        assert_eq!(question_text(&json!({ "question": null })).unwrap(), "");
        assert_eq!(question_text(&json!({})).unwrap(), "");
    }

    #[test]
    fn structured_questions_and_bodies_are_rejected() {
        assert!(matches!(
            question_text(&json!({ "question": ["a"] })),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            question_text(&json!("just a string")),
            Err(ApiError::BadRequest(_))
        ));
    }
}

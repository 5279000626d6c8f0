//! Declarative request validation.
//!
//! A route's rules are plain data: a list of [`FieldRule`]s for path
//! parameters and another for the JSON body. One interpreter, [`check`],
//! evaluates any list against a JSON object, sanitizing string values in
//! place and collecting one [`FieldError`] per failed check. The [`validate`]
//! middleware runs the interpreter before the handler and answers 422 on any
//! failure, so handlers only ever see input that passed.

use std::collections::HashMap;

use axum::body::{to_bytes, Body};
use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ApiError;

const BODY_LIMIT: usize = 64 * 1024;
const STATUSES: &[&str] = &["UPCOMING", "IN_PROGRESS", "COMPLETED"];
const PRIORITIES: &[&str] = &["LOW", "MEDIUM", "HIGH"];

/// One failed check, serialized as `{"<field>": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: &'static str,
}

impl FieldError {
    pub fn general(message: &'static str) -> Self {
        Self {
            field: "general".to_string(),
            message,
        }
    }
}

impl Serialize for FieldError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, self.message)?;
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    /// Skipped when the field is absent.
    Optional,
    /// Skipped when the field is absent, null or an empty string.
    OptionalEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sanitizer {
    Trim,
    /// HTML-escapes `& < > " ' / \` and backtick.
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// A string or null.
    Text,
    NonEmpty,
    OneOf(&'static [&'static str]),
    /// Hyphenated UUID.
    Uuid,
}

#[derive(Debug, Clone, Copy)]
pub struct Check {
    pub constraint: Constraint,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub presence: Presence,
    pub sanitizers: &'static [Sanitizer],
    pub checks: &'static [Check],
}

/// Rules installed on one route.
#[derive(Debug, Clone, Copy)]
pub struct RouteRules {
    pub params: &'static [FieldRule],
    pub body: Option<&'static [FieldRule]>,
}

const CLEAN: &[Sanitizer] = &[Sanitizer::Trim, Sanitizer::Escape];

const STATUS_RULE: FieldRule = FieldRule {
    field: "status",
    presence: Presence::Optional,
    sanitizers: &[],
    checks: &[Check {
        constraint: Constraint::OneOf(STATUSES),
        message: "Invalid task status",
    }],
};

const PRIORITY_RULE: FieldRule = FieldRule {
    field: "priority",
    presence: Presence::Optional,
    sanitizers: &[],
    checks: &[Check {
        constraint: Constraint::OneOf(PRIORITIES),
        message: "Invalid task priority",
    }],
};

const DESCRIPTION_CHECKS: &[Check] = &[Check {
    constraint: Constraint::Text,
    message: "Task description must be text",
}];

pub const CREATE_TASK_FIELDS: &[FieldRule] = &[
    FieldRule {
        field: "name",
        presence: Presence::Required,
        sanitizers: CLEAN,
        checks: &[Check {
            constraint: Constraint::NonEmpty,
            message: "Task name is required",
        }],
    },
    FieldRule {
        field: "description",
        presence: Presence::Optional,
        sanitizers: CLEAN,
        checks: DESCRIPTION_CHECKS,
    },
    STATUS_RULE,
    PRIORITY_RULE,
];

pub const UPDATE_TASK_FIELDS: &[FieldRule] = &[
    FieldRule {
        field: "name",
        presence: Presence::Optional,
        sanitizers: CLEAN,
        checks: &[Check {
            constraint: Constraint::NonEmpty,
            message: "Task name cannot be empty",
        }],
    },
    FieldRule {
        field: "description",
        presence: Presence::OptionalEmpty,
        sanitizers: CLEAN,
        checks: DESCRIPTION_CHECKS,
    },
    STATUS_RULE,
    PRIORITY_RULE,
];

pub const TASK_ID_PARAMS: &[FieldRule] = &[FieldRule {
    field: "id",
    presence: Presence::Required,
    sanitizers: &[],
    checks: &[Check {
        constraint: Constraint::Uuid,
        message: "Invalid task ID format",
    }],
}];

pub const CREATE_TASK: RouteRules = RouteRules {
    params: &[],
    body: Some(CREATE_TASK_FIELDS),
};

pub const UPDATE_TASK: RouteRules = RouteRules {
    params: TASK_ID_PARAMS,
    body: Some(UPDATE_TASK_FIELDS),
};

pub const TASK_ID: RouteRules = RouteRules {
    params: TASK_ID_PARAMS,
    body: None,
};

const NOT_AN_OBJECT: &str = "Request body must be a JSON object";
const UNREADABLE_BODY: &str = "Request body could not be read";

/// Evaluates `rules` against `fields`, rewriting sanitized strings in place.
pub fn check(rules: &[FieldRule], fields: &mut Map<String, Value>) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for rule in rules {
        let skip = match (rule.presence, fields.get(rule.field)) {
            (Presence::Required, _) => false,
            (Presence::Optional, value) => value.is_none(),
            (Presence::OptionalEmpty, None | Some(Value::Null)) => true,
            (Presence::OptionalEmpty, Some(Value::String(text))) => text.is_empty(),
            (Presence::OptionalEmpty, Some(_)) => false,
        };
        if skip {
            continue;
        }

        if let Some(Value::String(text)) = fields.get_mut(rule.field) {
            for sanitizer in rule.sanitizers {
                *text = sanitize(*sanitizer, text);
            }
        }

        let value = fields.get(rule.field);
        for check in rule.checks {
            if !satisfies(check.constraint, value) {
                errors.push(FieldError {
                    field: rule.field.to_string(),
                    message: check.message,
                });
            }
        }
    }

    errors
}

fn sanitize(sanitizer: Sanitizer, text: &str) -> String {
    match sanitizer {
        Sanitizer::Trim => text.trim().to_string(),
        Sanitizer::Escape => {
            let mut escaped = String::with_capacity(text.len());
            for ch in text.chars() {
                match ch {
                    '&' => escaped.push_str("&amp;"),
                    '<' => escaped.push_str("&lt;"),
                    '>' => escaped.push_str("&gt;"),
                    '"' => escaped.push_str("&quot;"),
                    '\'' => escaped.push_str("&#x27;"),
                    '/' => escaped.push_str("&#x2F;"),
                    '\\' => escaped.push_str("&#x5C;"),
                    '`' => escaped.push_str("&#96;"),
                    other => escaped.push(other),
                }
            }
            escaped
        }
    }
}

fn satisfies(constraint: Constraint, value: Option<&Value>) -> bool {
    match (constraint, value) {
        (Constraint::Text, Some(Value::String(_) | Value::Null)) => true,
        (Constraint::NonEmpty, Some(Value::String(text))) => !text.is_empty(),
        (Constraint::OneOf(allowed), Some(Value::String(text))) => allowed.contains(&text.as_str()),
        (Constraint::Uuid, Some(Value::String(text))) => {
            text.len() == 36 && uuid::Uuid::try_parse(text).is_ok()
        }
        _ => false,
    }
}

/// Middleware: validates path parameters and (optionally) the JSON body of
/// the request against `rules`. Short-circuits with 422 on failure; otherwise
/// forwards the request with its sanitized body.
pub async fn validate(
    State(rules): State<RouteRules>,
    params: Option<Path<HashMap<String, String>>>,
    request: Request,
    next: Next,
) -> Response {
    let mut param_fields: Map<String, Value> = params
        .map(|Path(params)| {
            params
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect()
        })
        .unwrap_or_default();
    let mut errors = check(rules.params, &mut param_fields);

    let request = match rules.body {
        None => request,
        Some(body_rules) => {
            let (mut parts, body) = request.into_parts();
            let sanitized = match to_bytes(body, BODY_LIMIT).await {
                Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                    Ok(Value::Object(mut fields)) => {
                        errors.extend(check(body_rules, &mut fields));
                        serde_json::to_vec(&Value::Object(fields)).unwrap_or_default()
                    }
                    _ => {
                        errors.push(FieldError::general(NOT_AN_OBJECT));
                        Vec::new()
                    }
                },
                Err(_) => {
                    errors.push(FieldError::general(UNREADABLE_BODY));
                    Vec::new()
                }
            };
            parts.headers.remove(header::CONTENT_LENGTH);
            parts.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            Request::from_parts(parts, Body::from(sanitized))
        }
    };

    if !errors.is_empty() {
        debug!(uri = %request.uri(), ?errors, "request rejected by validation");
        return ApiError::Validation(errors).into_response();
    }
    next.run(request).await
}

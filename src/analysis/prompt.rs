// Reasoning request rendering and response interpretation for AI escalation.

use crate::analysis::{Alert, ProposedAction, Severity};
use crate::robot::RobotSnapshot;
use crate::suggestion::{NewSuggestion, SuggestionSource};
use serde_json::{Map, Value};
use std::fmt;

/// System instruction fixing the JSON response schema
pub const SYSTEM_PROMPT: &str = "You are an AI advisor for the Argus ground station managing autonomous robot swarms. \
When presented with an alert about a robot, analyze the situation and provide a JSON response with these fields:\n\
- \"title\": short summary (max 60 chars)\n\
- \"description\": 1-2 sentence explanation\n\
- \"reasoning\": detailed analysis of why this matters\n\
- \"severity\": \"info\" | \"warning\" | \"critical\"\n\
- \"confidence\": 0.0-1.0\n\
- \"proposedAction\": null or {\"commandType\": \"...\", \"robotId\": \"...\", \"parameters\": {...}}\n\
\nAvailable command types: goto, stop, return_home, patrol, set_speed.\n\
Respond ONLY with valid JSON.";

/// Render the alert/robot context block sent as user content
pub fn build_context(robot: &RobotSnapshot, alert: &Alert) -> String {
    let (lat, lon, alt) = robot
        .position
        .map(|p| (p.latitude, p.longitude, p.altitude))
        .unwrap_or((0.0, 0.0, 0.0));

    format!(
        "Alert: {}\n\
         Robot: {} ({}), type={}, status={}\n\
         Position: lat={:.5}, lon={:.5}, alt={:.1}m\n\
         Speed: {:.1} m/s, Heading: {:.0}deg\n\
         Battery: {:.0}%, Signal: {:.0}%\n\
         Alert details: {}\n\
         Heuristic reasoning: {}\n",
        alert.alert_type,
        robot.name,
        robot.id,
        robot.robot_type,
        robot.status,
        lat,
        lon,
        alt,
        robot.speed,
        robot.heading,
        robot.battery_percent.unwrap_or(0.0),
        robot.signal_strength.unwrap_or(0.0),
        alert.description,
        alert.reasoning,
    )
}

/// Reasons an AI response could not be used
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseError {
    InvalidJson(String),
    NotAnObject,
    InvalidField(&'static str),
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseError::InvalidJson(e) => write!(f, "response is not valid JSON: {}", e),
            ResponseError::NotAnObject => write!(f, "response must be a JSON object"),
            ResponseError::InvalidField(name) => write!(f, "field '{}' has the wrong type", name),
        }
    }
}

impl std::error::Error for ResponseError {}

/// Remove surrounding markdown code fences (``` or ```json) if present
pub fn strip_code_fences(content: &str) -> &str {
    let text = content.trim();
    if !text.starts_with("```") {
        return text;
    }
    let mut body = match text.split_once('\n') {
        Some((_, rest)) => rest,
        None => &text[3..],
    };
    if let Some(stripped) = body.trim_end().strip_suffix("```") {
        body = stripped;
    }
    body.trim()
}

/// Interpret a raw AI completion as a suggestion for `alert`.
///
/// Fields absent (or null) in the response fall back to the alert's values;
/// confidence falls back to `default_confidence` and is clamped into 0..=1.
/// An explicit `"proposedAction": null` means no action.
pub fn parse_ai_response(
    content: &str,
    alert: &Alert,
    default_confidence: f64,
) -> Result<NewSuggestion, ResponseError> {
    let value: Value = serde_json::from_str(strip_code_fences(content))
        .map_err(|e| ResponseError::InvalidJson(e.to_string()))?;
    let data = value.as_object().ok_or(ResponseError::NotAnObject)?;

    let title = string_field(data, "title")?.unwrap_or_else(|| alert.title.clone());
    let description = string_field(data, "description")?.unwrap_or_else(|| alert.description.clone());
    let reasoning = string_field(data, "reasoning")?.unwrap_or_else(|| alert.reasoning.clone());

    let severity = match present(data, "severity") {
        Some(v) => serde_json::from_value::<Severity>(v.clone())
            .map_err(|_| ResponseError::InvalidField("severity"))?,
        None => alert.severity,
    };

    let confidence = match present(data, "confidence") {
        Some(v) => v
            .as_f64()
            .filter(|c| c.is_finite())
            .ok_or(ResponseError::InvalidField("confidence"))?
            .clamp(0.0, 1.0),
        None => default_confidence,
    };

    let proposed_action = match data.get("proposedAction") {
        None => alert.proposed_action.clone(),
        Some(Value::Null) => None,
        Some(v) => Some(
            serde_json::from_value::<ProposedAction>(v.clone())
                .map_err(|_| ResponseError::InvalidField("proposedAction"))?,
        ),
    };

    Ok(NewSuggestion {
        robot_id: alert.robot_id.clone(),
        title,
        description,
        reasoning,
        severity,
        source: SuggestionSource::Ai,
        confidence,
        proposed_action,
    })
}

fn present<'a>(data: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    data.get(key).filter(|v| !v.is_null())
}

fn string_field(data: &Map<String, Value>, key: &'static str) -> Result<Option<String>, ResponseError> {
    match present(data, key) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ResponseError::InvalidField(key)),
        None => Ok(None),
    }
}

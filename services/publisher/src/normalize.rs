//! Maps raw upstream match events onto [`ShotsPayload`].
//!
//! The upstream schema is unstable, so every concept is read through an
//! ordered list of key paths; the first path yielding a usable value wins.
//! No path is assumed to be authoritative. The output is still untrusted and
//! goes through the publisher's validation like any other payload.

use crate::model::{FinalScore, MatchInfo, Shot, ShotsPayload};
use chrono::DateTime;
use serde_json::Value;

const MATCH_ID_PATHS: &[&[&str]] = &[&["id"], &["eventId"], &["matchId"]];
const HOME_TEAM_PATHS: &[&[&str]] = &[&["homeTeam", "name"], &["home", "name"]];
const AWAY_TEAM_PATHS: &[&[&str]] = &[&["awayTeam", "name"], &["away", "name"]];
const KICKOFF_PATHS: &[&[&str]] = &[
    &["startDate"],
    &["startTime"],
    &["startTimestamp"],
    &["startIso"],
    &["kickoff"],
];
const HOME_SCORE_PATHS: &[&[&str]] = &[
    &["homeScore", "current"],
    &["homeScore", "display"],
    &["homeScore"],
];
const AWAY_SCORE_PATHS: &[&[&str]] = &[
    &["awayScore", "current"],
    &["awayScore", "display"],
    &["awayScore"],
];
const PLAYER_PATHS: &[&[&str]] = &[&["player", "name"], &["player", "shortName"]];

/// Keys holding a shot array when shots arrive wrapped in an object
const SHOT_LIST_KEYS: &[&str] = &["shots", "attempts", "items"];
/// Keys probed when shots are embedded in the event document itself
const EVENT_SHOT_KEYS: &[&str] = &["shots", "shotmap", "attempts", "events", "attacks"];

const UNKNOWN_MATCH_ID: &str = "unknown-id";
const DEFAULT_HOME: &str = "Local";
const DEFAULT_AWAY: &str = "Visitante";
const DEFAULT_KICKOFF: &str = "1970-01-01T00:00:00Z";
const ANONYMOUS_PLAYER: &str = "Anónimo";

const SITUATIONS: &[(&str, &str)] = &[
    ("assisted", "Asistencia"),
    ("corner", "Córner"),
    ("free-kick", "Tiro libre"),
    ("set-piece", "Balón parado"),
    ("fast-break", "Contraataque"),
    ("regular", "Juego abierto"),
    ("penalty", "Penalti"),
    ("throw-in", "Saque de banda"),
];
const OUTCOMES: &[(&str, &str)] = &[
    ("goal", "Gol"),
    ("save", "Parada"),
    ("block", "Bloqueo"),
    ("miss", "Fallado"),
    ("post", "Poste"),
];
const BODY_PARTS: &[(&str, &str)] = &[
    ("left-foot", "Zurdo"),
    ("right-foot", "Diestro"),
    ("head", "Cabeza"),
];

/// Walk `path` through nested objects
fn lookup<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(doc, |node, key| node.get(key))
}

/// First path whose value `parse` accepts
fn first_match<T>(
    doc: &Value,
    paths: &[&[&str]],
    parse: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    paths
        .iter()
        .find_map(|path| lookup(doc, path).and_then(&parse))
}

/// Non-empty strings, and numbers rendered as text
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn as_finite_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Integers may arrive as floats (3.0) or strings; rounded, negatives clamp to 0
fn as_count(value: &Value) -> Option<u32> {
    as_finite_f64(value).map(|v| v.round().clamp(0.0, u32::MAX as f64) as u32)
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Null) | None => false,
    }
}

fn translate(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| *to)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn normalized_tag(value: Option<&Value>) -> Option<String> {
    let raw = match value? {
        Value::String(s) => s.clone(),
        Value::Null => return None,
        other => other.to_string(),
    };
    let tag = raw.trim().to_lowercase();
    (!tag.is_empty()).then_some(tag)
}

fn situation_label(value: Option<&Value>) -> String {
    match normalized_tag(value) {
        Some(tag) => translate(SITUATIONS, &tag)
            .map(str::to_string)
            .unwrap_or_else(|| capitalize(&tag)),
        None => "Desconocida".to_string(),
    }
}

fn outcome_label(value: Option<&Value>) -> String {
    match normalized_tag(value) {
        Some(tag) => translate(OUTCOMES, &tag)
            .map(str::to_string)
            .unwrap_or_else(|| capitalize(&tag)),
        None => "Desconocido".to_string(),
    }
}

fn body_part_label(value: Option<&Value>) -> String {
    normalized_tag(value)
        .and_then(|tag| translate(BODY_PARTS, &tag))
        .unwrap_or("Otro")
        .to_string()
}

/// Regulation minute plus added time; invalid added time counts as zero
fn shot_minute(time: Option<&Value>, added_time: Option<&Value>) -> u32 {
    let base = time.and_then(as_finite_f64).unwrap_or(0.0);
    let added = added_time.and_then(as_finite_f64).unwrap_or(0.0);
    (base.round() + added).round().clamp(0.0, u32::MAX as f64) as u32
}

/// Epoch seconds (or 13-digit milliseconds) become RFC 3339; anything else is
/// assumed to be ISO-8601 already.
pub fn kickoff_to_iso8601(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return raw.to_string();
    }

    let parsed = raw.parse::<i64>().ok().and_then(|value| {
        if raw.len() == 13 {
            DateTime::from_timestamp_millis(value)
        } else {
            DateTime::from_timestamp(value, 0)
        }
    });

    match parsed {
        Some(instant) => instant.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true),
        None => raw.to_string(),
    }
}

fn kickoff(event: &Value) -> String {
    first_match(event, KICKOFF_PATHS, |v| match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
    .map(|raw| kickoff_to_iso8601(&raw))
    .unwrap_or_else(|| DEFAULT_KICKOFF.to_string())
}

/// Shot list from either a bare array or an object wrapping one
pub fn shot_list(shots: &Value) -> &[Value] {
    match shots {
        Value::Array(items) => items,
        Value::Object(map) => SHOT_LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    }
}

/// Shot list embedded in an event document, if any
pub fn shots_from_event(event: &Value) -> &[Value] {
    EVENT_SHOT_KEYS
        .iter()
        .find_map(|key| event.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn map_shot(raw: &Value, home: &str, away: &str) -> Shot {
    let player = first_match(raw, PLAYER_PATHS, as_text)
        .unwrap_or_else(|| ANONYMOUS_PLAYER.to_string());
    let team = if is_truthy(raw.get("isHome")) { home } else { away };

    Shot {
        minute: shot_minute(raw.get("time"), raw.get("addedTime")),
        team: team.to_string(),
        player,
        xg: raw.get("xg").and_then(as_finite_f64).unwrap_or(0.0),
        xgot: Some(raw.get("xgot").and_then(as_finite_f64).unwrap_or(0.0)),
        situation: Some(situation_label(raw.get("situation"))),
        outcome: outcome_label(raw.get("shotType")),
        body_part: Some(body_part_label(raw.get("bodyPart"))),
    }
}

/// Normalize an upstream event and its shots into the published contract
pub fn normalize_event(event: &Value, shots: Option<&Value>) -> ShotsPayload {
    let home = first_match(event, HOME_TEAM_PATHS, as_text)
        .unwrap_or_else(|| DEFAULT_HOME.to_string());
    let away = first_match(event, AWAY_TEAM_PATHS, as_text)
        .unwrap_or_else(|| DEFAULT_AWAY.to_string());

    let match_info = MatchInfo {
        match_id: first_match(event, MATCH_ID_PATHS, as_text)
            .unwrap_or_else(|| UNKNOWN_MATCH_ID.to_string()),
        kickoff: kickoff(event),
        final_score: FinalScore {
            home: first_match(event, HOME_SCORE_PATHS, as_count).unwrap_or(0),
            away: first_match(event, AWAY_SCORE_PATHS, as_count).unwrap_or(0),
        },
        home,
        away,
    };

    let raw_shots = shots.map(shot_list).unwrap_or(&[]);
    let shots = raw_shots
        .iter()
        .map(|raw| map_shot(raw, &match_info.home, &match_info.away))
        .collect();

    ShotsPayload {
        match_info,
        shots,
    }
}

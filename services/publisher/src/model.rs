use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final score of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    /// Goals scored by the home team
    #[serde(rename = "local")]
    pub home: u32,
    /// Goals scored by the away team
    #[serde(rename = "visitante")]
    pub away: u32,
}

/// Match header of a shots payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    /// Externally assigned match identifier
    #[serde(rename = "idPartido")]
    pub match_id: String,
    /// Kickoff as an ISO-8601 date-time; no offset means UTC
    #[serde(rename = "fechaISO")]
    pub kickoff: String,
    /// Home team name
    #[serde(rename = "local")]
    pub home: String,
    /// Away team name
    #[serde(rename = "visitante")]
    pub away: String,
    /// Final score
    #[serde(rename = "marcadorFinal")]
    pub final_score: FinalScore,
}

/// A single shot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    #[serde(rename = "minuto")]
    pub minute: u32,
    /// Team name, not a home/away marker
    #[serde(rename = "equipo")]
    pub team: String,
    #[serde(rename = "jugador")]
    pub player: String,
    #[serde(rename = "xG")]
    pub xg: f64,
    #[serde(rename = "xGOT", default, skip_serializing_if = "Option::is_none")]
    pub xgot: Option<f64>,
    #[serde(rename = "situacion", default, skip_serializing_if = "Option::is_none")]
    pub situation: Option<String>,
    #[serde(rename = "resultado")]
    pub outcome: String,
    #[serde(rename = "tipo_disparo", default, skip_serializing_if = "Option::is_none")]
    pub body_part: Option<String>,
}

/// Normalized shots document for one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotsPayload {
    #[serde(rename = "partido")]
    pub match_info: MatchInfo,
    /// Shots in insertion order
    #[serde(rename = "disparos")]
    pub shots: Vec<Shot>,
}

/// Input of a publication
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PublicationRequest {
    pub match_id: String,
    pub storage_path: String,
    pub shots: ShotsPayload,
}

/// Outcome of a successful publication
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishResult {
    pub match_id: String,
    pub storage_path: String,
    /// Lowercase hex SHA-256 of the uploaded bytes
    pub checksum: String,
    pub size_bytes: u64,
    /// Instant the upload step completed
    pub uploaded_at: DateTime<Utc>,
}

/// Row stored in the matches index, a projection of the request and result
/// that allows lookups without fetching the blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchIndexRecord {
    pub id: String,
    pub date: DateTime<Utc>,
    pub home: String,
    pub away: String,
    pub storage_path: String,
    pub size_bytes: u64,
    pub checksum: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_uses_wire_names() {
        let raw = serde_json::json!({
            "partido": {
                "idPartido": "m1",
                "fechaISO": "2024-01-01T00:00:00+00:00",
                "local": "A",
                "visitante": "B",
                "marcadorFinal": {"local": 1, "visitante": 0}
            },
            "disparos": [
                {"minuto": 12, "equipo": "A", "jugador": "P", "xG": 0.32, "resultado": "Gol"}
            ]
        });

        let payload: ShotsPayload = serde_json::from_value(raw).unwrap();
        assert_eq!(payload.match_info.match_id, "m1");
        assert_eq!(payload.match_info.final_score.home, 1);
        assert_eq!(payload.shots[0].xgot, None);

        let back = serde_json::to_value(&payload.shots[0]).unwrap();
        assert!(back.get("xGOT").is_none());
        assert!(back.get("situacion").is_none());
        assert_eq!(back["xG"], 0.32);
    }

    #[test]
    fn test_negative_minute_is_rejected() {
        let raw = serde_json::json!({
            "minuto": -1, "equipo": "A", "jugador": "P", "xG": 0.1, "resultado": "Gol"
        });
        assert!(serde_json::from_value::<Shot>(raw).is_err());
    }
}

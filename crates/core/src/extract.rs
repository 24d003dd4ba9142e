use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Explanation used when the model text holds no structured payload.
pub const NO_EXPLANATION: &str = "no detailed explanation available";

static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json(.*?)```").expect("fenced block pattern is valid")
});

/// A model answer split into a short answer and a detailed explanation.
///
/// On the wire the two fields are named `quickrep` and `explication`,
/// which is the shape the prompt asks the model to produce.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructuredReply {
    /// The direct answer (e.g. `"8 × 7 = 56"`).
    #[serde(rename = "quickrep", default)]
    pub quick_answer: String,
    /// The step-by-step explanation.
    #[serde(rename = "explication", default)]
    pub explanation: String,
}

impl StructuredReply {
    /// Extracts the structured payload from raw model output.
    ///
    /// A ```` ```json ```` fenced block is tried first, then the span from
    /// the first `{` to the last `}` of the whole text. When neither
    /// decodes into an object carrying `quickrep` or `explication`, the
    /// raw text becomes the answer and the explanation is
    /// [`NO_EXPLANATION`]. This never fails.
    pub fn extract(raw: &str) -> Self {
        let candidates = [fenced_payload(raw), braced_payload(raw)];
        for candidate in candidates.into_iter().flatten() {
            if let Some(reply) = decode(candidate) {
                return reply;
            }
        }
        trace!("no structured payload in model output");
        Self {
            quick_answer: raw.to_owned(),
            explanation: NO_EXPLANATION.to_owned(),
        }
    }

    /// Decodes the content string of a relay envelope.
    ///
    /// Content that is not the two-field object is shown as plain text
    /// with no explanation.
    pub fn from_wire_content(content: &str) -> Self {
        match serde_json::from_str::<Map<String, Value>>(content) {
            Ok(map) => from_object(&map),
            Err(_) => Self {
                quick_answer: content.to_owned(),
                explanation: String::new(),
            },
        }
    }

    /// Encodes the reply as the JSON string carried in a relay envelope.
    pub fn to_wire_content(&self) -> String {
        json!({
            "quickrep": self.quick_answer,
            "explication": self.explanation,
        })
        .to_string()
    }

    /// Whether the explanation is worth showing.
    #[inline]
    pub fn has_explanation(&self) -> bool {
        let explanation = self.explanation.trim();
        !explanation.is_empty() && explanation != NO_EXPLANATION
    }
}

fn fenced_payload(raw: &str) -> Option<&str> {
    let captures = FENCED_JSON.captures(raw)?;
    captures.get(1).map(|m| m.as_str().trim())
}

fn braced_payload(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

fn decode(candidate: &str) -> Option<StructuredReply> {
    let Ok(Value::Object(map)) = serde_json::from_str(candidate) else {
        return None;
    };
    if !map.contains_key("quickrep") && !map.contains_key("explication") {
        return None;
    }
    Some(from_object(&map))
}

fn from_object(map: &Map<String, Value>) -> StructuredReply {
    StructuredReply {
        quick_answer: field_text(map.get("quickrep")),
        explanation: field_text(map.get("explication")),
    }
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        // Models sometimes answer `"quickrep": 56`.
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_payload() {
        let raw = "Voici la réponse :\n```json\n{\n  \"quickrep\": \"4 * 9 = 36\",\n  \"explication\": \"1. On compte 4 fois 9.\"\n}\n```\nBravo !";
        let reply = StructuredReply::extract(raw);
        assert_eq!(reply.quick_answer, "4 * 9 = 36");
        assert_eq!(reply.explanation, "1. On compte 4 fois 9.");
        assert!(reply.has_explanation());
    }

    #[test]
    fn test_bare_object() {
        let raw = r#"Bien sûr ! {"quickrep": "10", "explication": "5 + 5"} :)"#;
        let reply = StructuredReply::extract(raw);
        assert_eq!(reply.quick_answer, "10");
        assert_eq!(reply.explanation, "5 + 5");
    }

    #[test]
    fn test_missing_field_becomes_empty() {
        let reply = StructuredReply::extract(
            "```json\n{\"quickrep\": \"12\"}\n```",
        );
        assert_eq!(reply.quick_answer, "12");
        assert_eq!(reply.explanation, "");
        assert!(!reply.has_explanation());
    }

    #[test]
    fn test_non_string_fields() {
        let reply = StructuredReply::extract(
            r#"{"quickrep": 56, "explication": null}"#,
        );
        assert_eq!(reply.quick_answer, "56");
        assert_eq!(reply.explanation, "");
    }

    #[test]
    fn test_no_payload() {
        for raw in [
            "Je ne sais pas.",
            "{ pas du json }",
            "} à l'envers {",
            "```json\nnope\n```",
            r#"{"answer": "42"}"#,
        ] {
            let reply = StructuredReply::extract(raw);
            assert_eq!(reply.quick_answer, raw);
            assert_eq!(reply.explanation, NO_EXPLANATION);
            assert!(!reply.has_explanation());
        }
    }

    #[test]
    fn test_outermost_braces() {
        // The first `{` and the last `}` bound the candidate, so the
        // nested object alone is never tried.
        let raw = r#"noise { {"quickrep":"4","explication":"x"} } trailing"#;
        assert_eq!(braced_payload(raw).unwrap().len(), raw.len() - 15);
        let reply = StructuredReply::extract(raw);
        assert_eq!(reply.quick_answer, raw);
        assert_eq!(reply.explanation, NO_EXPLANATION);

        let raw = r#"Voici {"quickrep":"4","explication":"on a {2} et {2}"} fin"#;
        let reply = StructuredReply::extract(raw);
        assert_eq!(reply.quick_answer, "4");
        assert_eq!(reply.explanation, "on a {2} et {2}");
    }

    #[test]
    fn test_broken_fence_falls_back_to_braces() {
        let raw = "```json\n{\"quickrep\": \"3\",}\n```\n{\"quickrep\": \"3\"}";
        // The fenced candidate has a trailing comma, the braced span covers
        // both objects and is not valid either.
        let reply = StructuredReply::extract(raw);
        assert_eq!(reply.quick_answer, raw);

        let raw = "```json\noups\n``` {\"quickrep\": \"3\"}";
        let reply = StructuredReply::extract(raw);
        assert_eq!(reply.quick_answer, "3");
    }

    #[test]
    fn test_fenced_round_trip() {
        let originals = [
            StructuredReply {
                quick_answer: "8 × 7 = 56".to_owned(),
                explanation: "Étape 1: on prend 8 paquets de 7 billes."
                    .to_owned(),
            },
            StructuredReply {
                quick_answer: "{tricky}".to_owned(),
                explanation: "uses ``` and \"quotes\"\nand lines".to_owned(),
            },
            StructuredReply::default(),
        ];
        for original in originals {
            let encoded = serde_json::to_string_pretty(&original).unwrap();
            let raw = format!(
                "Super question !\n\n```json\n{encoded}\n```\n\nÀ toi de jouer."
            );
            // A fence inside a field would end the block early, but the
            // braced span still recovers the object.
            assert_eq!(StructuredReply::extract(&raw), original);
        }
    }

    #[test]
    fn test_wire_content() {
        let reply = StructuredReply {
            quick_answer: "8 × 7 = 56".to_owned(),
            explanation: "Étape 1: ...".to_owned(),
        };
        let content = reply.to_wire_content();
        let value: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["quickrep"], "8 × 7 = 56");
        assert_eq!(value["explication"], "Étape 1: ...");
        assert_eq!(StructuredReply::from_wire_content(&content), reply);

        let plain = StructuredReply::from_wire_content("juste du texte");
        assert_eq!(plain.quick_answer, "juste du texte");
        assert_eq!(plain.explanation, "");
    }
}

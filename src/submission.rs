use crate::error::{Result, SubmissionError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw payload returned by the submissions endpoint.
///
/// The payload is kept as an untyped tree so that the JSON file and the console dump
/// reproduce exactly what the server sent, in the order it sent it. The typed view
/// over `content` is built on demand by [`SubmissionResponse::submissions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionResponse(Value);

impl SubmissionResponse {
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }

    pub fn payload(&self) -> &Value {
        &self.0
    }

    pub fn into_payload(self) -> Value {
        self.0
    }

    /// True when the payload carries nothing worth presenting: null, `{}`, `[]` or `""`
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// `responseCode` echoed by the API in the body, if any
    pub fn response_code(&self) -> Option<i64> {
        self.0.get("responseCode").and_then(Value::as_i64)
    }

    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    /// Raw `content` records. `None` when the field is absent or not a list.
    pub fn content(&self) -> Option<&[Value]> {
        self.0
            .get("content")
            .and_then(Value::as_array)
            .map(|items| items.as_slice())
    }

    /// Typed view over `content`.
    ///
    /// Returns `Ok(None)` when there is no `content` list at all, and
    /// [`SubmissionError::Malformed`] when a record inside it cannot be read.
    pub fn submissions(&self) -> Result<Option<Vec<Submission>>> {
        let Some(content) = self.content() else {
            return Ok(None);
        };

        content
            .iter()
            .enumerate()
            .map(|(index, record)| Submission::from_value(index, record))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}

impl From<Value> for SubmissionResponse {
    fn from(payload: Value) -> Self {
        Self::new(payload)
    }
}

/// One completed response to a form
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: Option<String>,
    /// Answers in the order the API listed them
    pub answers: Vec<Answer>,
}

/// A single field's label/value pair within a submission
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub field_id: String,
    pub name: String,
    pub value: Option<Value>,
}

impl Submission {
    fn from_value(index: usize, record: &Value) -> Result<Self> {
        let obj = record.as_object().ok_or_else(|| {
            SubmissionError::Malformed(format!("submission #{} is not an object", index + 1))
        })?;

        let id = obj.get("id").and_then(|id| match id {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        let label = id.clone().unwrap_or_else(|| format!("#{}", index + 1));

        let answers = match obj.get("answers") {
            Some(Value::Object(map)) => Self::parse_answers(&label, map)?,
            // The API encodes an empty answer set as []
            Some(Value::Array(items)) if items.is_empty() => Vec::new(),
            Some(_) => {
                return Err(SubmissionError::Malformed(format!(
                    "submission {} has an unreadable 'answers' field",
                    label
                )))
            }
            None => {
                return Err(SubmissionError::Malformed(format!(
                    "submission {} has no 'answers' field",
                    label
                )))
            }
        };

        Ok(Self { id, answers })
    }

    fn parse_answers(label: &str, map: &Map<String, Value>) -> Result<Vec<Answer>> {
        map.iter()
            .map(|(field_id, entry)| {
                let name = entry.get("name").and_then(Value::as_str).ok_or_else(|| {
                    SubmissionError::Malformed(format!(
                        "answer {} of submission {} has no 'name'",
                        field_id, label
                    ))
                })?;

                Ok(Answer {
                    field_id: field_id.clone(),
                    name: name.to_string(),
                    value: entry.get("answer").cloned(),
                })
            })
            .collect()
    }

    pub fn answer(&self, field_id: &str) -> Option<&Answer> {
        self.answers.iter().find(|a| a.field_id == field_id)
    }
}

impl Answer {
    /// Column header used in CSV output: `<name> (ID: <field-id>)`
    pub fn column_label(&self) -> String {
        format!("{} (ID: {})", self.name, self.field_id)
    }

    /// Flattened cell text; absent and null answers become an empty string
    pub fn display_value(&self) -> String {
        self.value.as_ref().map(flatten_value).unwrap_or_default()
    }
}

/// Composite answers (full name, address, checkbox lists) come back as objects or
/// arrays; they are flattened into a single line for tabular output.
fn flatten_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(flatten_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .values()
            .map(flatten_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_payloads() {
        assert!(SubmissionResponse::new(Value::Null).is_empty());
        assert!(SubmissionResponse::new(json!({})).is_empty());
        assert!(SubmissionResponse::new(json!([])).is_empty());
        assert!(!SubmissionResponse::new(json!({"content": []})).is_empty());
    }

    #[test]
    fn test_missing_content_is_none() {
        let response = SubmissionResponse::new(json!({"responseCode": 200}));
        assert!(response.content().is_none());
        assert!(response.submissions().unwrap().is_none());

        let response = SubmissionResponse::new(json!({"content": null}));
        assert!(response.submissions().unwrap().is_none());
    }

    #[test]
    fn test_answers_keep_api_order() {
        let response = SubmissionResponse::new(json!({
            "content": [{
                "id": "5001",
                "answers": {
                    "9": {"name": "Zip", "answer": "1000"},
                    "3": {"name": "Email", "answer": "a@x.com"},
                    "5": {"name": "Submit"}
                }
            }]
        }));

        let submissions = response.submissions().unwrap().unwrap();
        assert_eq!(submissions.len(), 1);
        let ids: Vec<&str> = submissions[0]
            .answers
            .iter()
            .map(|a| a.field_id.as_str())
            .collect();
        assert_eq!(ids, vec!["9", "3", "5"]);
        assert_eq!(submissions[0].id.as_deref(), Some("5001"));
        assert_eq!(submissions[0].answer("5").unwrap().display_value(), "");
    }

    #[test]
    fn test_submission_without_answers_is_malformed() {
        let response = SubmissionResponse::new(json!({"content": [{"id": "1"}]}));
        let err = response.submissions().unwrap_err();
        assert!(matches!(err, SubmissionError::Malformed(_)));
        assert!(err.to_string().contains("no 'answers'"));
    }

    #[test]
    fn test_answer_without_name_is_malformed() {
        let response = SubmissionResponse::new(json!({
            "content": [{"answers": {"3": {"answer": "x"}}}]
        }));
        assert!(matches!(
            response.submissions(),
            Err(SubmissionError::Malformed(_))
        ));
    }

    #[test]
    fn test_empty_answer_list() {
        let response = SubmissionResponse::new(json!({"content": [{"answers": []}]}));
        let submissions = response.submissions().unwrap().unwrap();
        assert!(submissions[0].answers.is_empty());
    }

    #[test]
    fn test_column_label_and_composite_values() {
        let answer = Answer {
            field_id: "4".to_string(),
            name: "fullName".to_string(),
            value: Some(json!({"first": "Jan", "middle": "", "last": "Peeters"})),
        };
        assert_eq!(answer.column_label(), "fullName (ID: 4)");
        assert_eq!(answer.display_value(), "Jan Peeters");

        let checkbox = Answer {
            field_id: "7".to_string(),
            name: "options".to_string(),
            value: Some(json!(["Red", "Blue"])),
        };
        assert_eq!(checkbox.display_value(), "Red, Blue");

        let number = Answer {
            field_id: "8".to_string(),
            name: "age".to_string(),
            value: Some(json!(42)),
        };
        assert_eq!(number.display_value(), "42");
    }
}

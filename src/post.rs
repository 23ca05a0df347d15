use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// One search result as returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub text: String,
    /// `"Tue, 15 May 2012 18:05:44 +0000"`
    pub created_at: String,
}

impl Post {
    pub fn new(text: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created_at: created_at.into(),
        }
    }
}

/// Body of a search response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchEnvelope {
    pub max_id: i64,
    #[serde(default, deserialize_with = "skip_malformed_posts")]
    pub results: Vec<Post>,
}

/// Decode each result on its own so one bad record does not sink the batch.
fn skip_malformed_posts<'de, D>(deserializer: D) -> Result<Vec<Post>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<Post>(value) {
            Ok(post) => Some(post),
            Err(e) => {
                warn!(index, error = %e, "dropping malformed search result");
                None
            }
        })
        .collect())
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionList {
    pub subscriptions: Vec<Subscription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub number: String,
}

impl SubscriptionList {
    pub fn numbers(&self) -> Vec<String> {
        self.subscriptions.iter().map(|s| s.number.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_envelope() {
        let body = r#"{
            "max_id": 202629879405625344,
            "results": [
                {"text": "Caltrain delayed again", "created_at": "Tue, 15 May 2012 18:05:44 +0000", "from_user": "rider"},
                {"text": "nice ride", "created_at": "Tue, 15 May 2012 18:01:02 +0000"}
            ]
        }"#;
        let envelope: SearchEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.max_id, 202629879405625344);
        assert_eq!(envelope.results.len(), 2);
        assert_eq!(envelope.results[0].text, "Caltrain delayed again");
        assert_eq!(envelope.results[1].created_at, "Tue, 15 May 2012 18:01:02 +0000");
    }

    #[test]
    fn test_decode_envelope_skips_malformed_results() {
        let body = r#"{
            "max_id": 9,
            "results": [
                {"text": "first delay", "created_at": "Tue, 15 May 2012 18:05:44 +0000"},
                {"text": "no timestamp"},
                {"text": null, "created_at": "Tue, 15 May 2012 18:06:00 +0000"},
                {"text": "numeric stamp", "created_at": 1337105144},
                "not even an object",
                {"text": "last", "created_at": "Tue, 15 May 2012 18:07:00 +0000"}
            ]
        }"#;
        let envelope: SearchEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.max_id, 9);
        let texts: Vec<&str> = envelope.results.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["first delay", "last"]);
    }

    #[test]
    fn test_results_must_be_a_list() {
        let body = r#"{"max_id": 1, "results": {}}"#;
        assert!(serde_json::from_str::<SearchEnvelope>(body).is_err());
    }

    #[test]
    fn test_decode_envelope_without_results() {
        let envelope: SearchEnvelope = serde_json::from_str(r#"{"max_id": 7}"#).unwrap();
        assert!(envelope.results.is_empty());
    }

    #[test]
    fn test_envelope_requires_max_id() {
        assert!(serde_json::from_str::<SearchEnvelope>(r#"{"results": []}"#).is_err());
    }

    #[test]
    fn test_subscription_numbers_keep_order() {
        let list: SubscriptionList = serde_json::from_str(
            r#"{"subscriptions": [{"number": "+15555550100"}, {"number": "+15555550101"}]}"#,
        )
        .unwrap();
        assert_eq!(list.numbers(), vec!["+15555550100", "+15555550101"]);
    }
}

use std::collections::HashMap;
use std::path::Path;

use crate::models::{PresentationQuery, PresentationRequestTemplate};

/// Loads every `*.json` file under `dir` as a `PresentationRequestTemplate`
/// (§4.6). A missing directory yields an empty list rather than an error,
/// matching `Openid4vpConfig::presentation_requests_dir`'s "absent triggers
/// the legacy map" contract. A file that fails to parse is skipped with a
/// warning rather than aborting startup.
pub fn load_templates(dir: &Path) -> Vec<PresentationRequestTemplate> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut templates = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|contents| serde_json::from_str(&contents).map_err(|e| e.to_string()))
        {
            Ok(template) => templates.push(template),
            Err(error) => {
                tracing::warn!(path = ?path, %error, "failed to load presentation request template");
            }
        }
    }
    templates
}

/// C5: turns requested scopes into a wallet-facing presentation query.
///
/// Owns the enabled template list loaded at boot plus the legacy
/// scope→credential-type map carried for deployments that predate
/// templates (§4.6).
pub struct PresentationBuilder {
    templates: Vec<PresentationRequestTemplate>,
    legacy_credential_map: HashMap<String, String>,
}

impl PresentationBuilder {
    pub fn new(
        templates: Vec<PresentationRequestTemplate>,
        legacy_credential_map: HashMap<String, String>,
    ) -> Self {
        Self {
            templates,
            legacy_credential_map,
        }
    }

    /// `FindTemplateByScopes` (§4.6): the first enabled template whose scope
    /// set is a subset of what's requested. Used both to build the query and,
    /// later, to drive claim mapping for the same exchange.
    pub fn find_template_by_scopes(
        &self,
        requested_scopes: &[String],
    ) -> Option<&PresentationRequestTemplate> {
        self.templates.iter().find(|t| t.covers(requested_scopes))
    }

    /// `BuildFromScopes` (§4.6): prefers a matching template; falls back to
    /// a generic query built from the legacy scope→credential map; falls
    /// back further to a maximally generic credential query when neither
    /// produces a match.
    pub fn build_from_scopes(&self, requested_scopes: &[String]) -> PresentationQuery {
        if let Some(template) = self.find_template_by_scopes(requested_scopes) {
            return template.query.clone();
        }
        self.legacy_query(requested_scopes)
    }

    fn legacy_query(&self, requested_scopes: &[String]) -> PresentationQuery {
        let credential_types: Vec<&str> = requested_scopes
            .iter()
            .filter_map(|scope| self.legacy_credential_map.get(scope))
            .map(String::as_str)
            .collect();

        if credential_types.is_empty() {
            return PresentationQuery::Dcql(serde_json::json!({
                "credentials": [{"id": "generic", "format": "vc+sd-jwt"}],
            }));
        }

        PresentationQuery::Dcql(serde_json::json!({
            "credentials": credential_types
                .iter()
                .enumerate()
                .map(|(i, credential_type)| {
                    serde_json::json!({
                        "id": format!("cred-{i}"),
                        "format": "vc+sd-jwt",
                        "meta": {"vct_values": [credential_type]},
                    })
                })
                .collect::<Vec<_>>(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(id: &str, scopes: &[&str]) -> PresentationRequestTemplate {
        PresentationRequestTemplate {
            id: id.into(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            query: PresentationQuery::Dcql(serde_json::json!({"id": id})),
            claim_mappings: HashMap::new(),
            claim_transforms: HashMap::new(),
            enabled: true,
        }
    }

    #[test]
    fn picks_first_covering_template() {
        let builder = PresentationBuilder::new(
            vec![template("pid", &["openid", "pid"])],
            HashMap::new(),
        );
        let found = builder
            .find_template_by_scopes(&["openid".to_string(), "pid".to_string(), "extra".to_string()])
            .unwrap();
        assert_eq!(found.id, "pid");
    }

    #[test]
    fn disabled_template_is_skipped() {
        let mut t = template("pid", &["pid"]);
        t.enabled = false;
        let builder = PresentationBuilder::new(vec![t], HashMap::new());
        assert!(builder
            .find_template_by_scopes(&["pid".to_string()])
            .is_none());
    }

    #[test]
    fn falls_back_to_legacy_credential_map() {
        let builder = PresentationBuilder::new(
            vec![],
            HashMap::from([("pid".to_string(), "urn:eudi:pid:1".to_string())]),
        );
        let query = builder.build_from_scopes(&["pid".to_string()]);
        match query {
            PresentationQuery::Dcql(v) => {
                assert_eq!(v["credentials"][0]["meta"]["vct_values"][0], "urn:eudi:pid:1");
            }
            other => panic!("expected Dcql, got {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_generic_query_when_nothing_matches() {
        let builder = PresentationBuilder::new(vec![], HashMap::new());
        let query = builder.build_from_scopes(&["openid".to_string()]);
        match query {
            PresentationQuery::Dcql(v) => assert_eq!(v["credentials"][0]["id"], "generic"),
            other => panic!("expected Dcql, got {other:?}"),
        }
    }
}

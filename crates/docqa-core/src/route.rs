//! The two addressable screens and their path form

use thiserror::Error;
use url::form_urlencoded;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Route {
    /// Landing screen: document list and upload
    #[default]
    Documents,
    /// Question screen, optionally pre-selecting a document
    Ask { doc: Option<String> },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("unknown route '{0}'")]
    Unknown(String),
}

impl Route {
    pub fn parse(input: &str) -> Result<Self, RouteError> {
        let input = input.trim();
        let (path, query) = match input.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (input, None),
        };

        match path.trim_end_matches('/') {
            "" => Ok(Route::Documents),
            "/qa" | "qa" => {
                let doc = query.and_then(|q| {
                    form_urlencoded::parse(q.as_bytes())
                        .find(|(key, _)| key == "doc")
                        .map(|(_, value)| value.into_owned())
                        .filter(|value| !value.is_empty())
                });
                Ok(Route::Ask { doc })
            }
            _ => Err(RouteError::Unknown(input.to_string())),
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Route::Documents => "/".to_string(),
            Route::Ask { doc: None } => "/qa".to_string(),
            Route::Ask { doc: Some(id) } => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair("doc", id)
                    .finish();
                format!("/qa?{}", query)
            }
        }
    }
}

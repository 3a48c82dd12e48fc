use async_trait::async_trait;
use reqwest::{Response, Url};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ApiError, ConfigError};
use crate::models::{ActivityMap, ErrorDetail, SignupResult};

/// Backend operations the roster depends on.
#[async_trait]
pub trait ActivitiesApi: Send + Sync {
    async fn list_activities(&self) -> Result<ActivityMap, ApiError>;

    async fn signup(&self, activity: &str, email: &str) -> Result<SignupResult, ApiError>;

    async fn unregister(&self, activity: &str, email: &str) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub struct HttpActivitiesApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpActivitiesApi {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        if config.api_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(config.api_url.to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
        })
    }

    fn collection_url(&self) -> Url {
        self.url_with_segments(&["activities"])
    }

    fn action_url(&self, activity: &str, action: &str) -> Url {
        self.url_with_segments(&["activities", activity, action])
    }

    // `push` percent-encodes each segment, so names with spaces or slashes stay one segment.
    fn url_with_segments(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

fn connect_failed(url: &Url, err: impl ToString) -> ApiError {
    ApiError::Unreachable {
        url: url.to_string(),
        reason: err.to_string(),
    }
}

async fn rejected(resp: Response) -> ApiError {
    let status = resp.status();
    // A body that is not `{detail: string}` counts as "no detail".
    let detail = resp
        .json::<ErrorDetail>()
        .await
        .ok()
        .and_then(|body| body.detail);
    ApiError::Rejected { status, detail }
}

#[async_trait]
impl ActivitiesApi for HttpActivitiesApi {
    async fn list_activities(&self) -> Result<ActivityMap, ApiError> {
        let url = self.collection_url();
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| connect_failed(&url, e))?;

        if !resp.status().is_success() {
            let err = rejected(resp).await;
            warn!(url = %url, error = %err, "activities_api_list_failed");
            return Err(err);
        }

        let activities: ActivityMap = resp.json().await.map_err(|e| ApiError::Malformed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        debug!(count = activities.len(), "activities_api_list_ok");
        Ok(activities)
    }

    async fn signup(&self, activity: &str, email: &str) -> Result<SignupResult, ApiError> {
        let url = self.action_url(activity, "signup");
        let resp = self
            .client
            .post(url.clone())
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| connect_failed(&url, e))?;

        if !resp.status().is_success() {
            let err = rejected(resp).await;
            warn!(
                activity = %activity,
                email = %email,
                error = %err,
                detail = ?err.detail(),
                "activities_api_signup_failed"
            );
            return Err(err);
        }

        // Only `message` is read from the body and it is optional.
        let body = resp
            .json::<SignupResult>()
            .await
            .unwrap_or(SignupResult { message: None });
        debug!(activity = %activity, email = %email, "activities_api_signup_ok");
        Ok(body)
    }

    async fn unregister(&self, activity: &str, email: &str) -> Result<(), ApiError> {
        let url = self.action_url(activity, "unregister");
        let resp = self
            .client
            .delete(url.clone())
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| connect_failed(&url, e))?;

        if !resp.status().is_success() {
            let err = rejected(resp).await;
            warn!(
                activity = %activity,
                email = %email,
                error = %err,
                detail = ?err.detail(),
                "activities_api_unregister_failed"
            );
            return Err(err);
        }

        debug!(activity = %activity, email = %email, "activities_api_unregister_ok");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_at(base: &str) -> HttpActivitiesApi {
        let config = Config::default().with_api_url(base).unwrap();
        HttpActivitiesApi::new(&config).unwrap()
    }

    #[test]
    fn encodes_activity_name_as_single_segment() {
        let api = api_at("http://127.0.0.1:8000");
        let url = api.action_url("Chess Club/Advanced", "signup");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8000/activities/Chess%20Club%2FAdvanced/signup"
        );
    }

    #[test]
    fn keeps_base_path_prefix() {
        let api = api_at("http://school.example/api/");
        assert_eq!(
            api.collection_url().as_str(),
            "http://school.example/api/activities"
        );
    }
}

//! Raw access to the speaker's NSDK endpoints.
//!
//! Reads and writes are both GET requests carrying everything in the query
//! string, including a `_nocache` token so that no cache between here and
//! the speaker ever answers for it.
//!
//! Reads distinguish two kinds of trouble:
//! * the speaker could not be reached, answered with a non-2xx status or
//!   timed out: a connectivity [`Error`] is returned
//! * the speaker answered, but with an error object or anything other than
//!   an array: the path is taken to be unsupported and an empty result is
//!   returned
//!
//! Writes never fail; they report success as a `bool` so that a single
//! rejected control action cannot take down the poll loop.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use url::Url;

use crate::{
    config::Config,
    error::{Error, Result},
    http::Client as HttpClient,
    nsdk::{self, Role},
    util,
};

#[derive(Clone)]
pub struct Transport {
    http_client: Arc<HttpClient>,
    base_url: Url,
}

impl Transport {
    const GET_DATA: &'static str = "/api/getData";
    const SET_DATA: &'static str = "/api/setData";

    /// # Errors
    ///
    /// Will return `Err` if no valid base URL can be made out of the
    /// configured host.
    pub fn new(config: &Config, http_client: Arc<HttpClient>) -> Result<Self> {
        let base_url = Url::parse(&format!("http://{}", config.host))?;
        debug!("speaker base url: {base_url}");

        Ok(Self {
            http_client,
            base_url,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base_url.join(endpoint)?;
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("_nocache", &util::nocache_token().to_string());
        Ok(url)
    }

    /// Reads `path`.
    ///
    /// # Errors
    ///
    /// Will return a connectivity `Err` if the request fails, times out or
    /// is answered with a non-2xx status.
    pub async fn get_data(&self, path: &str, roles: &str) -> Result<Vec<Value>> {
        let url = self.url(Self::GET_DATA, &[("path", path), ("roles", roles)])?;
        let request = self.http_client.get(url);

        let response = self
            .http_client
            .execute(request)
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(Error::connectivity)?;
        let body = response.text().await.map_err(Error::connectivity)?;

        let data = match serde_json::from_str::<Value>(&body) {
            Ok(Value::Array(data)) => data,
            Ok(Value::Object(object)) if object.contains_key("error") => {
                let message = object
                    .get("error")
                    .and_then(|error| error.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error");
                debug!("{path}: {message}");
                Vec::new()
            }
            Ok(other) => {
                debug!("{path}: ignoring response that is not a list: {other}");
                Vec::new()
            }
            Err(e) => {
                debug!("{path}: ignoring response that is not JSON: {e}");
                Vec::new()
            }
        };

        trace!("{path}: {data:?}");
        Ok(data)
    }

    /// Reads `path` and decodes its first value.
    ///
    /// A value that does not decode into `T` is treated the same as a
    /// missing one.
    ///
    /// # Errors
    ///
    /// As [`Self::get_data`].
    pub async fn get_first<T>(&self, path: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let first = self
            .get_data(path, nsdk::ROLES_VALUE)
            .await?
            .into_iter()
            .next();

        Ok(first.and_then(|value| match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                debug!("{path}: ignoring value of unexpected shape: {e}");
                None
            }
        }))
    }

    /// Writes `value` to `path`.
    ///
    /// Returns whether the speaker accepted the write. Failures are logged.
    pub async fn set_data<T>(&self, path: &str, value: &T, role: Role) -> bool
    where
        T: Serialize + ?Sized,
    {
        let value = match serde_json::to_string(value) {
            Ok(value) => value,
            Err(e) => {
                error!("failed to encode data for {path}: {e}");
                return false;
            }
        };

        let url = match self.url(
            Self::SET_DATA,
            &[("path", path), ("role", role.as_str()), ("value", value.as_str())],
        ) {
            Ok(url) => url,
            Err(e) => {
                error!("failed to set data for {path}: {e}");
                return false;
            }
        };

        trace!("{path} ({role}): {value}");
        let request = self.http_client.get(url);
        match self
            .http_client
            .execute(request)
            .await
            .and_then(reqwest::Response::error_for_status)
        {
            Ok(_) => true,
            Err(e) => {
                error!("failed to set data for {path}: {e}");
                false
            }
        }
    }

    /// Fetches the human-readable status page.
    ///
    /// # Errors
    ///
    /// Will return a connectivity `Err` if the request fails or times out.
    /// The status code is not checked; whatever the speaker serves is
    /// returned for scraping.
    pub async fn status_page(&self) -> Result<String> {
        let url = self.base_url.join(nsdk::PATH_STATUS_PAGE)?;
        let request = self.http_client.get(url);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(Error::connectivity)?;
        response.text().await.map_err(Error::connectivity)
    }
}

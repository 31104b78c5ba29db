use backon::{ExponentialBuilder, Retryable};
use tracing::error;
use url::Url;

pub struct CompletionApi;

impl CompletionApi {
    /// POST a completion request; 5xx answers and transport errors are retried per `retry_policy`.
    pub async fn try_post<T>(
        client: reqwest::Client,
        url: Url,
        api_key: impl AsRef<str>,
        retry_policy: ExponentialBuilder,
        body: &T,
    ) -> Result<reqwest::Response, reqwest::Error>
    where
        T: serde::Serialize,
    {
        (|| async {
            let resp = client
                .post(url.clone())
                .bearer_auth(api_key.as_ref())
                .json(body)
                .send()
                .await?;
            if resp.status().is_server_error()
                && let Err(err) = resp.error_for_status_ref()
            {
                error!(status = %resp.status(), "completion server error (will retry)");
                return Err(err);
            }
            Ok(resp)
        })
        .retry(retry_policy)
        .await
    }
}

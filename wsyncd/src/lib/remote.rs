//! Client side of the remote run server protocol.

use std::time::Duration;

use futures::Future;
use serde::de::DeserializeOwned;
use wsync::{
    protocol::{FolderResponse, Request, RunRequest, RunResponse},
    Error,
};

const CHECK_FOLDER_TIMEOUT: Duration = Duration::from_secs(30);
const RUN_CODE_TIMEOUT: Duration = Duration::from_secs(300);

/// The remote run server.
/// Transport failures are reported as [Error::NoResponse], a well-formed reply is
/// returned as is, `success == false` included.
pub trait Remote: Send + Sync + 'static {
    fn check_folder(
        &self,
        host: &str,
        folder_name: &str,
    ) -> impl Future<Output = wsync::Result<FolderResponse>> + Send;

    fn run_code(
        &self,
        host: &str,
        request: RunRequest,
    ) -> impl Future<Output = wsync::Result<RunResponse>> + Send;
}

/// [Remote] reached over HTTP with JSON bodies
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    port: u16,
}

impl HttpRemote {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_port(wsync::REMOTE_PORT)
    }

    pub fn with_port(port: u16) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, port })
    }

    pub fn endpoint(&self, host: &str) -> wsync::Result<url::Url> {
        let host = host.trim();
        if host.is_empty() {
            wsync::config_bail!("server address is not set");
        }
        url::Url::parse(&format!("http://{host}:{}", self.port))
            .map_err(|err| wsync::config_error!("invalid server address {host}: {err}"))
    }

    async fn post<T>(&self, host: &str, request: &Request, timeout: Duration) -> wsync::Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(host)?;
        log::trace!(target: "remote", "POST {url} {request:?}");
        let resp = self
            .client
            .post(url.clone())
            .json(request)
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| wsync::no_response_error!("{url}: {err}"))?;
        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|err| wsync::no_response_error!("{url}: {err}"))?;
        match serde_json::from_slice(&body) {
            Ok(reply) => Ok(reply),
            Err(_) if !status.is_success() => {
                Err(wsync::no_response_error!("{url} answered with {status}"))
            }
            Err(err) => Err(wsync::remote_error!("unexpected reply from {url}: {err}")),
        }
    }
}

impl Remote for HttpRemote {
    async fn check_folder(&self, host: &str, folder_name: &str) -> wsync::Result<FolderResponse> {
        let request = Request::CheckFolder {
            folder_name: folder_name.to_string(),
        };
        self.post(host, &request, CHECK_FOLDER_TIMEOUT).await
    }

    async fn run_code(&self, host: &str, request: RunRequest) -> wsync::Result<RunResponse> {
        let request = Request::from(request);
        self.post(host, &request, RUN_CODE_TIMEOUT).await
    }
}

/// Turn a folder check reply into the server-side folder path
pub fn folder_path(reply: FolderResponse) -> wsync::Result<String> {
    if reply.success {
        Ok(reply.folder_path.unwrap_or_default())
    } else {
        Err(Error::Remote(
            reply
                .error
                .unwrap_or_else(|| "the server could not prepare the folder".to_string()),
        ))
    }
}

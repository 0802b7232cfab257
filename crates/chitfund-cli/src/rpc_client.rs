// crates/chitfund-cli/src/rpc_client.rs
//
// Lightweight JSON-RPC client that POSTs to the chitfund-daemon HTTP endpoint.
// The session token from `chitfund auth login` is kept in a file under the
// user's config directory and sent as a Bearer header.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Path appended to the `--rpc` base URL.
pub const CALL_PATH: &str = "chitfund.rpc.FundService/Call";

/// Errors surfaced to the CLI user.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Could not reach daemon: {0}")]
    Http(#[from] reqwest::Error),

    /// The daemon answered with `success: false`.
    #[error("{message} (code {code})")]
    Rpc { code: u16, message: String },

    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Mirrors the server's JsonRpcRequest envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub method: String,
    pub params: serde_json::Value,
}

/// Mirrors the server's JsonRpcResponse envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub success: bool,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    #[serde(default)]
    pub code: u16,
}

impl JsonRpcResponse {
    /// Turn the envelope into the result value or an `Rpc` error.
    pub fn into_result(self) -> Result<serde_json::Value, CliError> {
        if self.success {
            Ok(self.result.unwrap_or(serde_json::Value::Null))
        } else {
            Err(CliError::Rpc {
                code: self.code,
                message: self
                    .error
                    .unwrap_or_else(|| "Request failed".to_string()),
            })
        }
    }
}

/// Client bound to one daemon endpoint, carrying the saved session token.
pub struct RpcClient {
    url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl RpcClient {
    pub fn new(base: &str) -> Self {
        Self {
            url: endpoint_url(base),
            token: load_token(),
            http: reqwest::Client::new(),
        }
    }

    /// Send a call and deserialize the result into `Resp`.
    pub async fn call<Req, Resp>(&self, method: &str, params: &Req) -> Result<Resp, CliError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let value = self.call_value(method, serde_json::to_value(params)?).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Send a call and return the raw result value.
    pub async fn call_value(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, CliError> {
        let request = JsonRpcRequest {
            method: method.to_string(),
            params,
        };

        let mut builder = self.http.post(&self.url).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let rpc_response: JsonRpcResponse = builder.send().await?.json().await?;
        rpc_response.into_result()
    }
}

fn endpoint_url(base: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), CALL_PATH)
}

/// `<config dir>/chitfund/session`, e.g. `~/.config/chitfund/session`.
pub fn token_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("chitfund").join("session"))
}

fn load_token() -> Option<String> {
    let path = token_path()?;
    std::fs::read_to_string(path)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

pub fn save_token(token: &str) -> Result<(), CliError> {
    let Some(path) = token_path() else {
        return Err(CliError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no config directory for this user",
        )));
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, token)?;
    Ok(())
}

pub fn clear_token() -> Result<(), CliError> {
    if let Some(path) = token_path() {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_url() {
        assert_eq!(
            endpoint_url("http://localhost:50051/"),
            "http://localhost:50051/chitfund.rpc.FundService/Call"
        );
    }

    #[test]
    fn test_error_envelope() {
        let resp: JsonRpcResponse = serde_json::from_value(json!({
            "success": false,
            "result": null,
            "error": "Not found: fund",
            "code": 404
        }))
        .unwrap();
        match resp.into_result() {
            Err(CliError::Rpc { code, message }) => {
                assert_eq!(code, 404);
                assert_eq!(message, "Not found: fund");
            }
            other => panic!("expected rpc error, got {:?}", other),
        }
    }

    #[test]
    fn test_success_envelope() {
        let resp: JsonRpcResponse = serde_json::from_value(json!({
            "success": true,
            "result": {"members": 2},
            "error": null,
            "code": 200
        }))
        .unwrap();
        assert_eq!(resp.into_result().unwrap()["members"], 2);
    }
}

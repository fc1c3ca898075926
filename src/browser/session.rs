use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SERVER_SCRIPT: &str = "node/browser_server.js";

#[derive(Error, Debug)]
pub enum SessionError {
    /// Node.js subprocess failed to spawn
    #[error("Failed to spawn {script} (is Node.js installed?): {source}")]
    Spawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Session I/O error: {0}")]
    Io(String),

    #[error("Session protocol error on '{command}': {error}")]
    Protocol { command: String, error: String },

    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// What the pipeline needs from a live page.
pub trait PageSession {
    fn navigate(&mut self, url: &str) -> Result<(), SessionError>;

    /// Rendered markup of the current page.
    fn page_source(&mut self) -> Result<String, SessionError>;

    /// Number of elements on the current page matching an XPath expression.
    fn count_xpath(&mut self, xpath: &str) -> Result<u32, SessionError>;
}

/// Request sent to browser_server.js over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BrowserRequest {
    Navigate { cmd: &'static str, url: String },
    Content { cmd: &'static str },
    QueryCount { cmd: &'static str, selector: String },
    Quit { cmd: &'static str },
}

impl BrowserRequest {
    pub fn navigate(url: &str) -> Self {
        BrowserRequest::Navigate {
            cmd: "navigate",
            url: url.to_string(),
        }
    }

    pub fn content() -> Self {
        BrowserRequest::Content { cmd: "content" }
    }

    pub fn query_count(selector: &str) -> Self {
        BrowserRequest::QueryCount {
            cmd: "query_count",
            selector: selector.to_string(),
        }
    }

    pub fn quit() -> Self {
        BrowserRequest::Quit { cmd: "quit" }
    }
}

/// Response received from browser_server.js over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
}

/// A persistent browser session backed by browser_server.js.
///
/// Launches a long-lived Node.js process that keeps a Chromium browser open.
/// Commands are sent as NDJSON over stdin, responses read from stdout.
pub struct BrowserSession {
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
    current_url: Option<String>,
}

impl BrowserSession {
    /// Launch a new browser session by spawning the given server script.
    pub fn launch(script: &Path) -> Result<Self, SessionError> {
        let script_name = script.display().to_string();
        let mut child = Command::new("node")
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| SessionError::Spawn {
                script: script_name.clone(),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SessionError::Io(format!("Failed to capture stdin of {}", script_name)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SessionError::Io(format!("Failed to capture stdout of {}", script_name)))?;

        let mut reader = BufReader::new(stdout);

        // Wait for the ready signal
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| SessionError::Io(format!("Failed to read ready signal: {}", e)))?;

        let response: BrowserResponse =
            serde_json::from_str(line.trim()).map_err(|e| SessionError::Json {
                context: "ready signal".into(),
                source: e,
            })?;

        if !response.ok || response.ready != Some(true) {
            return Err(SessionError::Protocol {
                command: "launch".into(),
                error: format!("Did not receive ready signal from {}", script_name),
            });
        }

        tracing::debug!(script = %script_name, "Browser session ready");

        Ok(BrowserSession {
            child,
            stdin,
            reader,
            current_url: None,
        })
    }

    /// Send a request and read the response.
    fn send(&mut self, request: &BrowserRequest) -> Result<BrowserResponse, SessionError> {
        let json = serde_json::to_string(request).map_err(|e| SessionError::Json {
            context: "BrowserRequest".into(),
            source: e,
        })?;

        writeln!(self.stdin, "{}", json)
            .map_err(|e| SessionError::Io(format!("Failed to write to browser server stdin: {}", e)))?;

        self.stdin
            .flush()
            .map_err(|e| SessionError::Io(format!("Failed to flush browser server stdin: {}", e)))?;

        let mut line = String::new();
        self.reader.read_line(&mut line).map_err(|e| {
            SessionError::Io(format!("Failed to read from browser server stdout: {}", e))
        })?;

        if line.trim().is_empty() {
            return Err(SessionError::Io(
                "Empty response from browser server (process may have died)".into(),
            ));
        }

        serde_json::from_str(line.trim()).map_err(|e| SessionError::Json {
            context: "browser server response".into(),
            source: e,
        })
    }

    /// Send a request and verify it succeeded.
    fn send_ok(
        &mut self,
        request: &BrowserRequest,
        command_name: &str,
    ) -> Result<BrowserResponse, SessionError> {
        let response = self.send(request)?;
        if !response.ok {
            return Err(SessionError::Protocol {
                command: command_name.into(),
                error: response.error.unwrap_or_else(|| "Unknown error".into()),
            });
        }
        Ok(response)
    }

    /// Get the last known URL (cached, no browser call).
    pub fn last_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    /// Quit the browser session.
    pub fn quit(&mut self) -> Result<(), SessionError> {
        // Best-effort: the process may already be gone
        let _ = self.send(&BrowserRequest::quit());
        let _ = self.child.wait();
        Ok(())
    }
}

impl PageSession for BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.send_ok(&BrowserRequest::navigate(url), "navigate")?;
        self.current_url = Some(url.to_string());
        Ok(())
    }

    fn page_source(&mut self) -> Result<String, SessionError> {
        let response = self.send_ok(&BrowserRequest::content(), "content")?;
        response.html.ok_or_else(|| SessionError::Protocol {
            command: "content".into(),
            error: "No html in content response".into(),
        })
    }

    fn count_xpath(&mut self, xpath: &str) -> Result<u32, SessionError> {
        let selector = format!("xpath={}", xpath);
        let response = self.send_ok(&BrowserRequest::query_count(&selector), "query_count")?;
        Ok(response.count.unwrap_or(0))
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}

// ============================================================================
// Static page (no browser)
// ============================================================================

/// In-memory stand-in for a browser: serves fixed markup and answers XPath
/// queries from an explicit list of expressions that resolve.
#[derive(Debug, Clone, Default)]
pub struct StaticPage {
    pub markup: String,
    pub resolvable: Vec<String>,
    pub visited: Vec<String>,
    pub queries: Vec<String>,
}

impl StaticPage {
    pub fn new(markup: &str) -> Self {
        Self {
            markup: markup.to_string(),
            ..Self::default()
        }
    }

    pub fn resolving(mut self, xpath: &str) -> Self {
        self.resolvable.push(xpath.to_string());
        self
    }

    /// Load markup from a file, e.g. a saved page.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        Ok(Self::new(&std::fs::read_to_string(path)?))
    }
}

impl PageSession for StaticPage {
    fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.visited.push(url.to_string());
        Ok(())
    }

    fn page_source(&mut self) -> Result<String, SessionError> {
        Ok(self.markup.clone())
    }

    fn count_xpath(&mut self, xpath: &str) -> Result<u32, SessionError> {
        self.queries.push(xpath.to_string());
        Ok(self.resolvable.iter().filter(|x| x.as_str() == xpath).count() as u32)
    }
}

pub fn default_server_script() -> PathBuf {
    PathBuf::from(DEFAULT_SERVER_SCRIPT)
}

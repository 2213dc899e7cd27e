use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ScrapeError, NAV_TIMEOUT};

/// The narrow rendering port the supplemental fetchers run against:
/// navigate, simulate a tab click, read the settled DOM. Tests script it.
#[async_trait]
pub trait MenuPage: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError>;

    /// Click the tab whose visible text equals `label`
    /// (case-insensitive). `false` when no such tab exists.
    async fn click_tab(&mut self, label: &str) -> Result<bool, ScrapeError>;

    /// Visible text of the currently active tab, empty when there is none.
    async fn active_tab(&mut self) -> Result<String, ScrapeError>;

    /// Serialized DOM of the page as currently rendered.
    async fn html(&mut self) -> Result<String, ScrapeError>;

    async fn close(&mut self) -> Result<(), ScrapeError>;
}

#[async_trait]
pub trait Browser: Send + Sync {
    async fn open(&self) -> Result<Box<dyn MenuPage>, ScrapeError>;
}

const TAB_BAR_SELECTOR: &str = ".cu-dining-menu-tabs button, .cu-dining-menu-tabs a";

const CLICK_TAB_SCRIPT: &str = r#"
const label = arguments[0].toLowerCase();
const btn = Array.from(document.querySelectorAll(arguments[1]))
    .find((el) => el.textContent.trim().toLowerCase() === label);
if (btn) { btn.click(); return true; }
return false;
"#;

const ACTIVE_TAB_SCRIPT: &str = r#"
const btn = document.querySelector('.cu-dining-menu-tabs button.active');
return btn ? btn.textContent.trim() : '';
"#;

/// Production implementation of [`Browser`] speaking the WebDriver wire
/// protocol against a chromedriver/geckodriver endpoint.
pub struct WebDriverBrowser {
    client: reqwest::Client,
    base_url: String,
}

impl WebDriverBrowser {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .timeout(NAV_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn open(&self) -> Result<Box<dyn MenuPage>, ScrapeError> {
        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "goog:chromeOptions": {
                        "args": ["--headless=new", "--no-sandbox", "--disable-dev-shm-usage"]
                    }
                }
            }
        });
        let resp: Value = self
            .client
            .post(format!("{}/session", self.base_url))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        let session_id = resp["value"]["sessionId"]
            .as_str()
            .ok_or_else(|| ScrapeError::Navigation(format!("no session id in {resp}")))?
            .to_string();
        Ok(Box::new(WebDriverPage {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            session_id,
        }))
    }
}

struct WebDriverPage {
    client: reqwest::Client,
    base_url: String,
    session_id: String,
}

impl WebDriverPage {
    async fn post(&self, path: &str, body: Value) -> Result<Value, ScrapeError> {
        let url = format!("{}/session/{}/{}", self.base_url, self.session_id, path);
        let resp: Value = self.client.post(url).json(&body).send().await?.json().await?;
        if let Some(err) = resp["value"]["error"].as_str() {
            let message = resp["value"]["message"].as_str().unwrap_or("");
            return Err(ScrapeError::Navigation(format!("{err}: {message}")));
        }
        Ok(resp)
    }

    async fn execute(&self, script: &str, args: Value) -> Result<Value, ScrapeError> {
        let resp = self
            .post("execute/sync", json!({ "script": script, "args": args }))
            .await?;
        Ok(resp["value"].clone())
    }
}

#[async_trait]
impl MenuPage for WebDriverPage {
    async fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        self.post("url", json!({ "url": url })).await?;
        Ok(())
    }

    async fn click_tab(&mut self, label: &str) -> Result<bool, ScrapeError> {
        let value = self
            .execute(CLICK_TAB_SCRIPT, json!([label, TAB_BAR_SELECTOR]))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn active_tab(&mut self) -> Result<String, ScrapeError> {
        let value = self.execute(ACTIVE_TAB_SCRIPT, json!([])).await?;
        Ok(value.as_str().unwrap_or("").to_string())
    }

    async fn html(&mut self) -> Result<String, ScrapeError> {
        let url = format!("{}/session/{}/source", self.base_url, self.session_id);
        let resp: Value = self.client.get(url).send().await?.json().await?;
        resp["value"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ScrapeError::Extraction("page source unavailable".into()))
    }

    async fn close(&mut self) -> Result<(), ScrapeError> {
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        self.client.delete(url).send().await?;
        Ok(())
    }
}

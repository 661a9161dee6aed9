use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use hystore_core::source::{SourceDocument, SourceFetcher};

/// Serves repository bodies from memory. Unknown URLs fail like a 404.
#[derive(Debug, Default)]
pub struct MapFetcher {
    bodies: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
}

impl MapFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(self, url: &str, body: &str) -> Self {
        self.replace(url, body);
        self
    }

    pub fn replace(&self, url: &str, body: &str) {
        self.bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_string());
    }

    #[allow(dead_code)]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SourceFetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<SourceDocument> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = self.bodies.lock().unwrap().get(url).cloned();
        match body {
            Some(body) => SourceDocument::parse(&body),
            None => anyhow::bail!("HTTP 404 Not Found from {}", url),
        }
    }
}

#[allow(dead_code)]
pub fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[allow(dead_code)]
pub fn repo(name: &str, apps: &[(&str, &str)]) -> String {
    let apps: Vec<_> = apps
        .iter()
        .map(|(bundle, app_name)| {
            serde_json::json!({
                "bundleIdentifier": bundle,
                "name": app_name,
                "downloadURL": format!("https://cdn.example/{bundle}.ipa"),
            })
        })
        .collect();
    serde_json::json!({ "name": name, "apps": apps }).to_string()
}

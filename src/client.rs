use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;

use crate::types::{Collection, CollectionsResponse, Product, ProductsResponse};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; StorefrontGallery/0.1)";

/// Status and body of a completed GET request
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking GET. Transport failures are errors; any HTTP status is a response.
pub trait Fetch {
    fn get(&self, url: &str) -> Result<FetchResponse>;
}

pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpClient {
    fn get(&self, url: &str) -> Result<FetchResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch: {}", url))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .with_context(|| format!("Failed to read response: {}", url))?;
        Ok(FetchResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Catalog endpoints of one storefront
pub struct Storefront<'a, F: Fetch> {
    fetcher: &'a F,
    base_url: String,
}

impl<'a, F: Fetch> Storefront<'a, F> {
    pub fn new(fetcher: &'a F, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn fetcher(&self) -> &F {
        self.fetcher
    }

    pub fn collections_url(&self) -> String {
        format!("{}/collections.json", self.base_url)
    }

    pub fn products_url(&self, handle: &str, page: u32, limit: u32) -> String {
        format!(
            "{}/collections/{}/products.json?page={}&limit={}",
            self.base_url, handle, page, limit
        )
    }

    pub fn collections(&self) -> Result<Vec<Collection>> {
        let url = self.collections_url();
        let response: CollectionsResponse = self.fetch_json(&url)?;
        Ok(response.collections)
    }

    pub fn products(&self, handle: &str, page: u32, limit: u32) -> Result<Vec<Product>> {
        let url = self.products_url(handle, page, limit);
        let response: ProductsResponse = self.fetch_json(&url)?;
        Ok(response.products)
    }

    fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.fetcher.get(url)?;
        if !response.is_success() {
            bail!("Request to {} returned HTTP {}", url, response.status);
        }
        serde_json::from_slice(&response.body)
            .with_context(|| format!("Failed to parse JSON: {}", url))
    }
}

/// In-memory storefront for tests
#[cfg(test)]
pub mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};

    #[derive(Default)]
    pub struct FakeFetch {
        routes: RefCell<HashMap<String, VecDeque<FetchResponse>>>,
        requests: RefCell<Vec<String>>,
    }

    impl FakeFetch {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a response for `url`. The last queued response repeats once the queue drains.
        pub fn route(&self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> &Self {
            self.routes
                .borrow_mut()
                .entry(url.to_string())
                .or_default()
                .push_back(FetchResponse {
                    status,
                    body: body.into(),
                });
            self
        }

        pub fn count(&self, url: &str) -> usize {
            self.requests.borrow().iter().filter(|u| *u == url).count()
        }
    }

    impl Fetch for FakeFetch {
        fn get(&self, url: &str) -> Result<FetchResponse> {
            self.requests.borrow_mut().push(url.to_string());
            let mut routes = self.routes.borrow_mut();
            let Some(queue) = routes.get_mut(url) else {
                return Ok(FetchResponse {
                    status: 404,
                    body: Vec::new(),
                });
            };
            let response = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            response.with_context(|| format!("No response queued for {}", url))
        }
    }
}

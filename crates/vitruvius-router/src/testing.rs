use http::Method;

use crate::RoutableRequest;

#[derive(Debug, Clone)]
pub(crate) struct FakeRequest {
    method: Method,
    path: String,
    subdomain: Option<String>,
    accept: Option<String>,
    query: Vec<(String, String)>,
}

impl FakeRequest {
    pub(crate) fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            subdomain: None,
            accept: None,
            query: Vec::new(),
        }
    }

    pub(crate) fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn with_subdomain(mut self, subdomain: &str) -> Self {
        self.subdomain = Some(subdomain.to_string());
        self
    }

    pub(crate) fn with_accept(mut self, accept: &str) -> Self {
        self.accept = Some(accept.to_string());
        self
    }

    pub(crate) fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

impl RoutableRequest for FakeRequest {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn subdomain(&self) -> Option<&str> {
        self.subdomain.as_deref()
    }

    fn accept(&self) -> Option<&str> {
        self.accept.as_deref()
    }

    fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn has_query(&self) -> bool {
        !self.query.is_empty()
    }
}

//! Test client for in-memory request testing.

use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use vitruvius_lifecycle::Application;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// A test client that runs requests through an [`Application`] without a
/// server.
///
/// Cookies set by responses are kept in a jar and sent back on later
/// requests, so session state carries over like it would in a browser.
///
/// # Example
///
/// ```
/// use vitruvius_core::{ActionController, ActionResult};
/// use vitruvius_lifecycle::Application;
/// use vitruvius_router::Route;
/// use vitruvius_test::TestClient;
///
/// # tokio_test::block_on(async {
/// let app = Application::builder()
///     .route(Route::builder("home", "/").handler("home").build().unwrap())
///     .unwrap()
///     .controller(
///         "home",
///         ActionController::new("Home")
///             .action("index", |_ctx, _params| Box::pin(async { Ok(ActionResult::from("Hello")) })),
///     )
///     .build();
///
/// let client = TestClient::new(app);
/// client
///     .get("/")
///     .accept("text/plain")
///     .send()
///     .await
///     .assert_status(http::StatusCode::OK)
///     .assert_body_eq("Hello");
/// # });
/// ```
#[must_use]
pub struct TestClient {
    app: Arc<Application>,
    default_headers: Vec<(String, String)>,
    cookies: Mutex<IndexMap<String, String>>,
}

impl TestClient {
    /// Creates a client for an application.
    pub fn new(app: Application) -> Self {
        Self::from_shared(Arc::new(app))
    }

    /// Creates a client for a shared application.
    pub fn from_shared(app: Arc<Application>) -> Self {
        Self {
            app,
            default_headers: Vec::new(),
            cookies: Mutex::new(IndexMap::new()),
        }
    }

    /// The application under test.
    #[must_use]
    pub fn app(&self) -> &Application {
        &self.app
    }

    /// Adds a header included in every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// A cookie currently held in the jar.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.lock().get(name).cloned()
    }

    /// Empties the cookie jar.
    pub fn clear_cookies(&self) {
        self.cookies.lock().clear();
    }

    /// Creates a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Creates a POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Creates a PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Creates a DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Creates a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        let mut builder = TestRequestBuilder::new(method, uri);
        for (name, value) in &self.default_headers {
            builder = builder.header(name, value);
        }
        TestClientRequest {
            client: self,
            builder,
        }
    }

    async fn send_internal(&self, builder: TestRequestBuilder) -> Result<TestResponse, TestError> {
        let builder = self.attach_cookies(builder);
        let request = builder.build()?;
        let response = TestResponse::from(self.app.handle(request).await);

        let mut jar = self.cookies.lock();
        for (name, value) in response.cookies() {
            jar.insert(name, value);
        }
        Ok(response)
    }

    fn attach_cookies(&self, mut builder: TestRequestBuilder) -> TestRequestBuilder {
        if builder.has_header(http::header::COOKIE.as_str()) {
            return builder;
        }
        for (name, value) in self.cookies.lock().iter() {
            builder = builder.cookie(name, value);
        }
        builder
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("app", &self.app)
            .field("default_headers", &self.default_headers)
            .field("cookies", &self.cookies.lock().len())
            .finish()
    }
}

/// A request builder bound to a test client.
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Appends a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the `Accept` header.
    pub fn accept(mut self, accept: impl AsRef<str>) -> Self {
        self.builder = self.builder.accept(accept);
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets a form-urlencoded body.
    pub fn form<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("failed to send test request: {e}"),
        }
    }

    /// Sends the request, returning build errors instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns an error if a header, body or URI was invalid.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        self.client.send_internal(self.builder).await
    }
}

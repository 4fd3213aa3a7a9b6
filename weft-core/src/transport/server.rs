//! Application Server
//!
//! [`App`] ties the pieces together: a router of page functions, a session
//! manager, and two listeners.
//!
//! - a `tiny_http` server for the initial page load: a plain GET renders the
//!   matched page (wrapped in its layouts) into a full document;
//! - a tokio TCP listener accepting WebSocket connections, one task per
//!   connection, over which live patches flow.
//!
//! The wrapped document exposes the WebSocket address in a
//! `<meta name="weft-ws">` tag; the embedder supplies its own client script
//! (via [`App::with_head`]) to open the channel and apply patches.

use std::net::SocketAddr;
use std::sync::Arc;

use tiny_http::{Header, Method, Response};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response as HandshakeResponse,
};

use crate::config::Config;
use crate::context::{Context, SessionStore};
use crate::error::{Error, Result};
use crate::render;
use crate::ui::Node;

use super::manager::SessionManager;
use super::router::Router;

/// Listen addresses and document chrome.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address of the HTTP page-load listener.
    pub http_addr: String,
    /// Address of the WebSocket listener.
    pub ws_addr: String,
    /// Document title.
    pub title: String,
    /// Raw markup injected into `<head>`, e.g. the client script tag.
    pub head: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:3000".to_string(),
            ws_addr: "127.0.0.1:3001".to_string(),
            title: "Weft App".to_string(),
            head: String::new(),
        }
    }
}

impl AppConfig {
    /// Build from a [`Config`], falling back to defaults per key.
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            http_addr: config.get_or("WEFT_HTTP_ADDR", &defaults.http_addr),
            ws_addr: config.get_or("WEFT_WS_ADDR", &defaults.ws_addr),
            title: config.get_or("WEFT_TITLE", &defaults.title),
            head: defaults.head,
        }
    }
}

/// The application: routes, sessions, and listeners.
pub struct App {
    router: Router,
    manager: Arc<SessionManager>,
    config: AppConfig,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create an application with an in-memory session store.
    pub fn new() -> Self {
        Self::with_store(None)
    }

    /// Create an application with a custom session store.
    pub fn with_store(store: Option<Arc<dyn SessionStore>>) -> Self {
        Self {
            router: Router::new(),
            manager: Arc::new(SessionManager::new(store)),
            config: AppConfig::default(),
        }
    }

    /// Replace the listen/document configuration.
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Append raw markup to the document `<head>`.
    pub fn with_head(mut self, head: impl Into<String>) -> Self {
        self.config.head.push_str(&head.into());
        self
    }

    /// Register a page under a pattern such as `/users/:id`.
    pub fn route<F>(&mut self, pattern: &str, page: F)
    where
        F: Fn(&mut Context) -> Node + Send + Sync + 'static,
    {
        self.router.add(pattern, Arc::new(page));
    }

    /// Register a layout for a path prefix, applied on the page-load path.
    pub fn layout<F>(&mut self, prefix: &str, layout: F)
    where
        F: Fn(&mut Context, Node) -> Node + Send + Sync + 'static,
    {
        self.router.add_layout(prefix, Arc::new(layout));
    }

    /// The session manager, e.g. for broadcasting system-wide notices.
    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Bind both listeners without serving yet.
    pub async fn bind(self) -> Result<BoundApp> {
        let http = tiny_http::Server::http(self.config.http_addr.as_str())
            .map_err(|error| Error::Http(error.to_string()))?;
        let http_addr = http
            .server_addr()
            .to_ip()
            .ok_or_else(|| Error::Http("listener has no ip address".to_string()))?;

        let ws_listener = TcpListener::bind(self.config.ws_addr.as_str()).await?;
        let ws_addr = ws_listener.local_addr()?;

        Ok(BoundApp {
            http: Arc::new(http),
            http_addr,
            ws_listener,
            ws_addr,
            router: Arc::new(self.router),
            manager: self.manager,
            config: self.config,
        })
    }

    /// Bind and serve until the process exits.
    pub async fn run(self) -> Result<()> {
        self.bind().await?.serve().await
    }
}

/// An application with both listeners bound, ready to serve.
pub struct BoundApp {
    http: Arc<tiny_http::Server>,
    http_addr: SocketAddr,
    ws_listener: TcpListener,
    ws_addr: SocketAddr,
    router: Arc<Router>,
    manager: Arc<SessionManager>,
    config: AppConfig,
}

impl BoundApp {
    /// Actual address of the HTTP listener.
    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    /// Actual address of the WebSocket listener.
    pub fn ws_addr(&self) -> SocketAddr {
        self.ws_addr
    }

    /// The session manager backing this app.
    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Serve both listeners. The HTTP side runs on its own thread (its
    /// request loop is blocking); the WebSocket accept loop runs here.
    pub async fn serve(self) -> Result<()> {
        tracing::info!(http = %self.http_addr, ws = %self.ws_addr, "weft serving");

        let http = Arc::clone(&self.http);
        let router = Arc::clone(&self.router);
        let config = self.config.clone();
        let ws_addr = self.ws_addr;
        std::thread::spawn(move || http_loop(http, router, config, ws_addr));

        loop {
            let (stream, peer) = self.ws_listener.accept().await?;
            tracing::debug!(peer = %peer, "websocket connection accepted");
            let router = Arc::clone(&self.router);
            let manager = Arc::clone(&self.manager);
            tokio::spawn(async move {
                handle_ws_connection(stream, router, manager).await;
            });
        }
    }
}

/// Accept the WebSocket handshake, resolve the page route from the upgrade
/// URL, and hand the connection to the session manager.
async fn handle_ws_connection(stream: TcpStream, router: Arc<Router>, manager: Arc<SessionManager>) {
    let mut request_uri: Option<String> = None;
    let callback = |request: &Request, response: HandshakeResponse| -> std::result::Result<HandshakeResponse, ErrorResponse> {
        request_uri = Some(request.uri().to_string());
        Ok(response)
    };

    let ws = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(error) => {
            tracing::debug!(error = %error, "websocket handshake failed");
            return;
        }
    };

    let (page_path, session_hint) = parse_ws_uri(request_uri.as_deref().unwrap_or("/"));
    let Some((page, params)) = router
        .match_path(&page_path)
        .or_else(|| router.match_path("/"))
    else {
        tracing::debug!(path = %page_path, "no route for websocket connection");
        return;
    };

    manager.run_connection(ws, page, params, session_hint).await;
}

/// Extract the page path and the optional session identifier from the
/// upgrade URL, e.g. `/ws?path=/users/42&session=s7`.
fn parse_ws_uri(uri: &str) -> (String, Option<String>) {
    let (_, query) = uri.split_once('?').unwrap_or((uri, ""));
    let mut page_path = "/".to_string();
    let mut session = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "path" => page_path = value.into_owned(),
            "session" => session = Some(value.into_owned()),
            _ => {}
        }
    }
    (page_path, session)
}

// ----------------------------------------------------------------------------
// HTTP page-load path
// ----------------------------------------------------------------------------

fn http_loop(server: Arc<tiny_http::Server>, router: Arc<Router>, config: AppConfig, ws_addr: SocketAddr) {
    for request in server.incoming_requests() {
        if let Err(error) = respond(request, &router, &config, ws_addr) {
            tracing::debug!(error = %error, "http response failed");
        }
    }
}

fn respond(
    request: tiny_http::Request,
    router: &Router,
    config: &AppConfig,
    ws_addr: SocketAddr,
) -> Result<()> {
    if *request.method() != Method::Get {
        let response = Response::from_string("method not allowed").with_status_code(405);
        return request.respond(response).map_err(Error::Io);
    }

    let path = request.url().split('?').next().unwrap_or("/").to_string();
    let Some((page, params)) = router.match_path(&path) else {
        let response = Response::from_string("not found").with_status_code(404);
        return request.respond(response).map_err(Error::Io);
    };

    let mut context = Context::new();
    context.params = params;
    context.reset_bindings();
    let mut content = page(&mut context);
    for layout in router.layouts_for(&path) {
        content = layout(&mut context, content);
    }

    let body = wrap_document(&render::html(&content), config, ws_addr);
    let response = Response::from_string(body).with_header(html_content_type());
    request.respond(response).map_err(Error::Io)
}

fn html_content_type() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
        .expect("static header is valid")
}

/// Wrap rendered page markup into a full document.
fn wrap_document(body: &str, config: &AppConfig, ws_addr: SocketAddr) -> String {
    let mut title = String::new();
    render::push_escaped(&mut title, &config.title);

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\n\
         <meta name=\"weft-ws\" content=\"ws://{ws_addr}\">\n\
         <title>{title}</title>\n\
         {head}\n\
         </head>\n\
         <body>\n\
         {body}\n\
         </body>\n\
         </html>\n",
        head = config.head,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_uri_parsing_extracts_path_and_session() {
        let (path, session) = parse_ws_uri("/ws?path=/users/42&session=s7");
        assert_eq!(path, "/users/42");
        assert_eq!(session.as_deref(), Some("s7"));
    }

    #[test]
    fn ws_uri_defaults_to_root_without_query() {
        let (path, session) = parse_ws_uri("/ws");
        assert_eq!(path, "/");
        assert!(session.is_none());
    }

    #[test]
    fn ws_uri_decodes_encoded_values() {
        let (path, _) = parse_ws_uri("/ws?path=%2Fusers%2F42");
        assert_eq!(path, "/users/42");
    }

    #[test]
    fn wrapped_document_contains_body_and_ws_address() {
        let config = AppConfig {
            title: "My <App>".to_string(),
            head: "<script src=\"/client.js\"></script>".to_string(),
            ..AppConfig::default()
        };
        let addr: SocketAddr = "127.0.0.1:3001".parse().expect("addr");
        let document = wrap_document("<div data-weft-id=\"0\"></div>", &config, addr);

        assert!(document.contains("<div data-weft-id=\"0\"></div>"));
        assert!(document.contains("ws://127.0.0.1:3001"));
        assert!(document.contains("<title>My &lt;App&gt;</title>"));
        assert!(document.contains("<script src=\"/client.js\"></script>"));
    }
}

//! Blocking ADT REST client.
//!
//! Two HTTP channels share one login:
//!
//! - the *session* channel carries locks, source reads/writes and activation
//!   and follows the session mode set through
//!   [`Transport::set_session_type`];
//! - the *stateless* channel carries everything that must not touch the
//!   locking session (pretty printer, main programs, discovery, expansion).
//!
//! Each channel keeps its own cookies and CSRF token.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use base64::Engine;

use prettysync_core::{
    ActivationResult, InactiveObject, Lock, MainProgram, ObjectDescriptor, SessionType, Transport,
    TransportError,
};

use crate::xml::{self, ActivationRef};

const TOKEN_PATH: &str = "/sap/bc/adt/compatibility/graph";
const LOGOFF_PATH: &str = "/sap/public/bc/icf/logoff";
const ACTIVATION_PATH: &str = "/sap/bc/adt/activation";
const PRETTY_PRINTER_PATH: &str = "/sap/bc/adt/abapsource/prettyprinter";
const NODE_STRUCTURE_PATH: &str = "/sap/bc/adt/repository/nodestructure";
const SEARCH_PATH: &str = "/sap/bc/adt/repository/informationsystem/search";

const LOCK_ACCEPT: &str =
    "application/*,application/vnd.sap.as+xml;charset=UTF-8;dataname=com.sap.adt.lock.result";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const XML: &str = "application/xml";

/// Connection settings.
#[derive(Debug, Clone)]
pub struct AdtConfig {
    /// Server root, e.g. `https://dev.example.com:44300`.
    pub base_url: String,
    pub user: String,
    pub password: String,
    /// `sap-client` query parameter.
    pub client: Option<String>,
    /// `sap-language` query parameter.
    pub language: Option<String>,
    pub timeout: Duration,
}

impl AdtConfig {
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            user: user.into(),
            password: password.into(),
            client: None,
            language: None,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelKind {
    Session,
    Stateless,
}

struct Channel {
    agent: ureq::Agent,
    csrf_token: Option<String>,
}

impl Channel {
    fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            csrf_token: None,
        }
    }
}

/// Request body with its content type.
type Body<'b> = Option<(&'b str, &'b str)>;

enum Reply {
    Body(String),
    /// 403 asking for a CSRF token; the token we sent is stale.
    TokenRejected(TransportError),
}

pub struct AdtClient {
    config: AdtConfig,
    authorization: String,
    session_type: Cell<SessionType>,
    session: RefCell<Channel>,
    stateless: RefCell<Channel>,
}

impl AdtClient {
    pub fn new(config: AdtConfig) -> Self {
        let credentials = format!("{}:{}", config.user, config.password);
        let authorization = format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credentials)
        );
        Self {
            session: RefCell::new(Channel::new(config.timeout)),
            stateless: RefCell::new(Channel::new(config.timeout)),
            session_type: Cell::new(SessionType::Stateless),
            authorization,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Request plumbing
    // -----------------------------------------------------------------------

    fn channel(&self, kind: ChannelKind) -> &RefCell<Channel> {
        match kind {
            ChannelKind::Session => &self.session,
            ChannelKind::Stateless => &self.stateless,
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.config.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    fn session_header(&self, kind: ChannelKind) -> SessionType {
        match kind {
            ChannelKind::Session => self.session_type.get(),
            ChannelKind::Stateless => SessionType::Stateless,
        }
    }

    /// Modifying requests need a CSRF token; fetch one with a harmless GET.
    fn ensure_token(&self, kind: ChannelKind) -> Result<(), TransportError> {
        if self.channel(kind).borrow().csrf_token.is_some() {
            return Ok(());
        }
        self.request(kind, "GET", TOKEN_PATH, &[], "*/*", None)?;
        if self.channel(kind).borrow().csrf_token.is_none() {
            return Err(TransportError::Protocol(
                "server did not hand out a CSRF token".to_string(),
            ));
        }
        Ok(())
    }

    /// Send one request. A modifying request whose cached CSRF token the
    /// server rejects is retried once with a fresh token.
    fn request(
        &self,
        kind: ChannelKind,
        method: &str,
        path: &str,
        query: &[(&str, &str)],
        accept: &str,
        body: Body<'_>,
    ) -> Result<String, TransportError> {
        match self.send(kind, method, path, query, accept, body)? {
            Reply::Body(text) => Ok(text),
            Reply::TokenRejected(err) if method != "GET" => {
                tracing::debug!("CSRF token rejected for {method} {path}, fetching a new one");
                self.channel(kind).borrow_mut().csrf_token = None;
                match self.send(kind, method, path, query, accept, body)? {
                    Reply::Body(text) => Ok(text),
                    Reply::TokenRejected(_) => Err(err),
                }
            }
            Reply::TokenRejected(err) => Err(err),
        }
    }

    fn send(
        &self,
        kind: ChannelKind,
        method: &str,
        path: &str,
        query: &[(&str, &str)],
        accept: &str,
        body: Body<'_>,
    ) -> Result<Reply, TransportError> {
        if method != "GET" {
            self.ensure_token(kind)?;
        }

        let url = self.url(path);
        let (agent, token) = {
            let channel = self.channel(kind).borrow();
            (channel.agent.clone(), channel.csrf_token.clone())
        };

        let mut req = agent
            .request(method, &url)
            .set("Authorization", &self.authorization)
            .set("Accept", accept)
            .set("x-csrf-token", token.as_deref().unwrap_or("fetch"))
            .set("X-sap-adt-sessiontype", &self.session_header(kind).to_string());
        if let Some(client) = &self.config.client {
            req = req.query("sap-client", client);
        }
        if let Some(language) = &self.config.language {
            req = req.query("sap-language", language);
        }
        for (key, value) in query {
            req = req.query(key, value);
        }

        tracing::debug!("{method} {url}");
        let result = match body {
            Some((content_type, text)) => req.set("Content-Type", content_type).send_string(text),
            None if method == "GET" => req.call(),
            None => req.send_string(""),
        };

        match result {
            Ok(resp) => {
                if let Some(token) = resp.header("x-csrf-token") {
                    if !token.eq_ignore_ascii_case("required") {
                        self.channel(kind).borrow_mut().csrf_token = Some(token.to_string());
                    }
                }
                resp.into_string()
                    .map(Reply::Body)
                    .map_err(|e| TransportError::Connection(e.to_string()))
            }
            Err(ureq::Error::Status(status, resp)) => {
                let token_required = status == 403
                    && resp
                        .header("x-csrf-token")
                        .is_some_and(|t| t.eq_ignore_ascii_case("required"));
                let body = resp.into_string().unwrap_or_default();
                let err = classify(status, url, body);
                if token_required {
                    Ok(Reply::TokenRejected(err))
                } else {
                    Err(err)
                }
            }
            Err(ureq::Error::Transport(t)) => Err(TransportError::Connection(t.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // Repository reads used by expansion and discovery
    // -----------------------------------------------------------------------

    /// Object nodes directly below `parent_name` of `parent_type`.
    pub fn node_structure(
        &self,
        parent_type: &str,
        parent_name: &str,
    ) -> Result<Vec<ObjectDescriptor>, TransportError> {
        let body = self.request(
            ChannelKind::Stateless,
            "POST",
            NODE_STRUCTURE_PATH,
            &[
                ("parent_type", parent_type),
                ("parent_name", parent_name),
                ("withShortDescriptions", "false"),
            ],
            "application/vnd.sap.as+xml",
            None,
        )?;
        xml::parse_node_structure(&body)
    }

    /// Quick search for objects named like `query`, optionally of one type.
    pub fn search_objects(
        &self,
        query: &str,
        object_type: Option<&str>,
    ) -> Result<Vec<ObjectDescriptor>, TransportError> {
        let mut params = vec![
            ("operation", "quickSearch"),
            ("query", query),
            ("maxResults", "100"),
        ];
        if let Some(t) = object_type {
            params.push(("objectType", t));
        }
        let body = self.request(ChannelKind::Stateless, "GET", SEARCH_PATH, &params, XML, None)?;
        Ok(xml::parse_object_references(&body)?
            .into_iter()
            .map(|(uri, object_type, name)| ObjectDescriptor::new(object_type, name).with_url(uri))
            .collect())
    }

    /// Class includes as `(kind, absolute source url)`.
    pub fn class_includes(&self, class_url: &str) -> Result<Vec<(String, String)>, TransportError> {
        let body = self.request(ChannelKind::Stateless, "GET", class_url, &[], "application/*", None)?;
        let base = class_url.trim_end_matches('/');
        Ok(xml::parse_class_includes(&body)?
            .into_iter()
            .map(|(kind, uri)| {
                let url = if uri.starts_with('/') {
                    uri
                } else {
                    format!("{base}/{uri}")
                };
                (kind, url)
            })
            .collect())
    }

    fn post_activation(&self, refs: &[ActivationRef<'_>]) -> Result<ActivationResult, TransportError> {
        let body = xml::activation_body(refs);
        let response = self.request(
            ChannelKind::Session,
            "POST",
            ACTIVATION_PATH,
            &[("method", "activate"), ("preauditRequested", "true")],
            XML,
            Some((XML, &body)),
        )?;
        xml::parse_activation(&response)
    }
}

/// Map an HTTP failure onto a [`TransportError`], preferring the remote's
/// own exception category and message.
fn classify(status: u16, url: String, body: String) -> TransportError {
    match xml::parse_exception(&body) {
        Some((category, message)) => TransportError::Remote { category, message },
        None => TransportError::Http { status, url, body },
    }
}

impl Transport for AdtClient {
    fn set_session_type(&self, session: SessionType) -> Result<(), TransportError> {
        tracing::debug!("session mode: {session}");
        self.session_type.set(session);
        Ok(())
    }

    fn drop_session(&self) -> Result<(), TransportError> {
        let result = self
            .request(ChannelKind::Session, "GET", LOGOFF_PATH, &[], "*/*", None)
            .map(|_| ());
        *self.session.borrow_mut() = Channel::new(self.config.timeout);
        self.session_type.set(SessionType::Stateless);
        result
    }

    fn lock(&self, url: &str) -> Result<Lock, TransportError> {
        let body = self.request(
            ChannelKind::Session,
            "POST",
            url,
            &[("_action", "LOCK"), ("accessMode", "MODIFY")],
            LOCK_ACCEPT,
            None,
        )?;
        xml::parse_lock(&body)
    }

    fn unlock(&self, url: &str, handle: &str) -> Result<(), TransportError> {
        self.request(
            ChannelKind::Session,
            "POST",
            url,
            &[("_action", "UNLOCK"), ("lockHandle", handle)],
            "*/*",
            None,
        )
        .map(|_| ())
    }

    fn get_object_source(&self, url: &str) -> Result<String, TransportError> {
        self.request(ChannelKind::Session, "GET", url, &[], "text/plain", None)
    }

    fn set_object_source(
        &self,
        url: &str,
        source: &str,
        handle: &str,
        tracking_id: Option<&str>,
    ) -> Result<(), TransportError> {
        let mut query = vec![("lockHandle", handle)];
        if let Some(id) = tracking_id {
            query.push(("corrNr", id));
        }
        self.request(
            ChannelKind::Session,
            "PUT",
            url,
            &query,
            "*/*",
            Some((TEXT_PLAIN, source)),
        )
        .map(|_| ())
    }

    fn activate(
        &self,
        name: &str,
        url: &str,
        main_program: Option<&str>,
    ) -> Result<ActivationResult, TransportError> {
        let uri = match main_program {
            Some(main) => format!("{url}?context={}", urlencoding::encode(main)),
            None => url.to_string(),
        };
        self.post_activation(&[ActivationRef {
            uri: &uri,
            name,
            object_type: None,
            parent_uri: None,
        }])
    }

    fn activate_inactive(
        &self,
        objects: &[InactiveObject],
    ) -> Result<ActivationResult, TransportError> {
        let refs: Vec<_> = objects
            .iter()
            .map(|o| ActivationRef {
                uri: &o.url,
                name: &o.name,
                object_type: Some(o.object_type.as_str()).filter(|t| !t.is_empty()),
                parent_uri: o.parent_url.as_deref(),
            })
            .collect();
        self.post_activation(&refs)
    }

    fn main_programs(&self, meta_url: &str) -> Result<Vec<MainProgram>, TransportError> {
        let path = format!("{}/mainprograms", meta_url.trim_end_matches('/'));
        let body = self.request(ChannelKind::Stateless, "GET", &path, &[], "application/*", None)?;
        xml::parse_main_programs(&body)
    }

    fn pretty_print(&self, source: &str) -> Result<String, TransportError> {
        self.request(
            ChannelKind::Stateless,
            "POST",
            PRETTY_PRINTER_PATH,
            &[],
            "text/plain",
            Some((TEXT_PLAIN, source)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client(server: &Server) -> AdtClient {
        AdtClient::new(AdtConfig::new(server.url(), "DEVELOPER", "secret"))
    }

    fn token_mock(server: &mut Server) -> mockito::Mock {
        server
            .mock("GET", TOKEN_PATH)
            .match_query(Matcher::Any)
            .match_header("x-csrf-token", "fetch")
            .with_status(200)
            .with_header("x-csrf-token", "TOKEN1")
            .create()
    }

    #[test]
    fn lock_fetches_token_and_parses_result() {
        let mut server = Server::new();
        let token = token_mock(&mut server);
        let lock = server
            .mock("POST", "/sap/bc/adt/programs/programs/zreport")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("_action".into(), "LOCK".into()),
                Matcher::UrlEncoded("accessMode".into(), "MODIFY".into()),
            ]))
            .match_header("x-csrf-token", "TOKEN1")
            .match_header("X-sap-adt-sessiontype", "stateful")
            .with_status(200)
            .with_body(
                "<asx:abap><asx:values><DATA><LOCK_HANDLE>H1</LOCK_HANDLE><CORRNR/><IS_LOCAL>X</IS_LOCAL></DATA></asx:values></asx:abap>",
            )
            .create();

        let client = client(&server);
        client.set_session_type(SessionType::Stateful).unwrap();
        let result = client.lock("/sap/bc/adt/programs/programs/zreport").unwrap();

        token.assert();
        lock.assert();
        assert_eq!(result.handle.as_deref(), Some("H1"));
        assert!(result.is_local);
    }

    #[test]
    fn stale_csrf_token_is_refreshed_once() {
        let mut server = Server::new();
        let _read = server
            .mock("GET", "/sap/bc/adt/programs/programs/zreport/source/main")
            .match_query(Matcher::Any)
            .with_header("x-csrf-token", "STALE")
            .with_body("REPORT zreport.")
            .create();
        let token = token_mock(&mut server);
        let rejected = server
            .mock("POST", "/sap/bc/adt/programs/programs/zreport")
            .match_query(Matcher::Any)
            .match_header("x-csrf-token", "STALE")
            .with_status(403)
            .with_header("x-csrf-token", "Required")
            .with_body("CSRF token validation failed")
            .create();
        let accepted = server
            .mock("POST", "/sap/bc/adt/programs/programs/zreport")
            .match_query(Matcher::Any)
            .match_header("x-csrf-token", "TOKEN1")
            .with_body(
                "<asx:abap><asx:values><DATA><LOCK_HANDLE>H2</LOCK_HANDLE><CORRNR/><IS_LOCAL>X</IS_LOCAL></DATA></asx:values></asx:abap>",
            )
            .create();

        let client = client(&server);
        client.set_session_type(SessionType::Stateful).unwrap();
        client
            .get_object_source("/sap/bc/adt/programs/programs/zreport/source/main")
            .unwrap();
        let lock = client.lock("/sap/bc/adt/programs/programs/zreport").unwrap();

        rejected.assert();
        token.assert();
        accepted.assert();
        assert_eq!(lock.handle.as_deref(), Some("H2"));
    }

    #[test]
    fn exception_body_becomes_remote_error() {
        let mut server = Server::new();
        let _token = token_mock(&mut server);
        let _lock = server
            .mock("POST", "/sap/bc/adt/programs/includes/zgen")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(
                r#"<exc:exception xmlns:exc="http://www.sap.com/abapxml/types/communicationframework"><type id="ExceptionResourceNoAccess"/><localizedMessage lang="EN">Generated object</localizedMessage></exc:exception>"#,
            )
            .create();

        let err = client(&server)
            .lock("/sap/bc/adt/programs/includes/zgen")
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::Remote {
                category: "ExceptionResourceNoAccess".into(),
                message: "Generated object".into(),
            }
        );
    }

    #[test]
    fn plain_http_failure_keeps_status() {
        let mut server = Server::new();
        let _source = server
            .mock("GET", "/sap/bc/adt/programs/programs/zreport/source/main")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create();

        let err = client(&server)
            .get_object_source("/sap/bc/adt/programs/programs/zreport/source/main")
            .unwrap_err();
        assert!(matches!(err, TransportError::Http { status: 500, .. }), "got: {err}");
    }

    #[test]
    fn write_sends_lock_handle_and_tracking_id() {
        let mut server = Server::new();
        let _token = token_mock(&mut server);
        let put = server
            .mock("PUT", "/p/zreport/source/main")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("lockHandle".into(), "H1".into()),
                Matcher::UrlEncoded("corrNr".into(), "DEVK900001".into()),
            ]))
            .match_body("REPORT ZREPORT.")
            .with_status(200)
            .create();

        client(&server)
            .set_object_source("/p/zreport/source/main", "REPORT ZREPORT.", "H1", Some("DEVK900001"))
            .unwrap();
        put.assert();
    }

    #[test]
    fn main_program_context_is_encoded_into_activation_uri() {
        let mut server = Server::new();
        let _token = token_mock(&mut server);
        let activation = server
            .mock("POST", ACTIVATION_PATH)
            .match_query(Matcher::Any)
            .match_body(Matcher::Regex(
                "adtcore:uri=\"/p/zinc\\?context=%2Fp%2Fzmain\"".into(),
            ))
            .with_status(200)
            .with_body("")
            .create();

        let result = client(&server)
            .activate("ZINC", "/p/zinc", Some("/p/zmain"))
            .unwrap();
        activation.assert();
        assert!(result.success);
    }

    #[test]
    fn pretty_printer_uses_stateless_session() {
        let mut server = Server::new();
        let _token = token_mock(&mut server);
        let printer = server
            .mock("POST", PRETTY_PRINTER_PATH)
            .match_query(Matcher::Any)
            .match_header("X-sap-adt-sessiontype", "stateless")
            .match_body("report zreport.")
            .with_status(200)
            .with_body("REPORT zreport.")
            .create();

        let client = client(&server);
        client.set_session_type(SessionType::Stateful).unwrap();
        let out = client.pretty_print("report zreport.").unwrap();
        printer.assert();
        assert_eq!(out, "REPORT zreport.");
    }
}

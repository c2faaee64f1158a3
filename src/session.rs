use std::{collections::BTreeMap, time::Duration};

use ureq::{Agent, Body, http::Response};

use crate::{
    config::Settings,
    error::{Error, Result},
};

/// Blocking HTTP session owned by a single downloader.
///
/// Every request carries the configured user agent and this session's cookies.
pub struct Session {
    agent: Agent,
    user_agent: String,
    cookies: BTreeMap<String, String>,
    body_limit: u64,
}

impl Session {
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut cfg = Agent::config_builder();
        if let Some(url) = settings.downloader_proxy.as_deref() {
            let proxy = ureq::Proxy::new(url).map_err(|source| Error::InvalidProxy {
                url: url.to_string(),
                source,
            })?;
            cfg = cfg.proxy(Some(proxy));
        }
        if let Some(secs) = settings.timeout {
            cfg = cfg.timeout_global(Some(Duration::from_secs(secs)));
        }
        Ok(Session {
            agent: Agent::new_with_config(cfg.build()),
            user_agent: settings.user_agent.clone(),
            cookies: BTreeMap::new(),
            body_limit: settings.max_document_bytes(),
        })
    }

    pub fn set_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    fn call(&self, url: &str, accept: Option<&str>) -> Result<Response<Body>> {
        let mut req = self
            .agent
            .get(url)
            .header("User-Agent", self.user_agent.as_str());
        if let Some(accept) = accept {
            req = req.header("Accept", accept);
        }
        if let Some(cookies) = self.cookie_header() {
            req = req.header("Cookie", cookies.as_str());
        }
        Ok(req.call()?)
    }

    /// Raw response body, bounded by the configured document size limit.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let mut res = self.call(url, None)?;
        let bytes = res
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_vec()?;
        Ok(bytes)
    }

    /// Response body decoded as strict UTF-8.
    pub fn get_text(&self, url: &str) -> Result<String> {
        Ok(self.call(url, None)?.body_mut().read_to_string()?)
    }

    /// Like [`Session::get_text`], negotiating the response type with `accept`.
    pub fn get_text_accepting(&self, url: &str, accept: &str) -> Result<String> {
        Ok(self.call(url, Some(accept))?.body_mut().read_to_string()?)
    }

    /// Page body decoded leniently; invalid UTF-8 sequences are replaced.
    pub fn get_body(&self, url: &str) -> Result<String> {
        let bytes = self.get_bytes(url)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io::{BufRead, BufReader, Write},
        net::TcpListener,
        thread,
    };

    /// Serve one request on a local port, replying `body`; yields the request head.
    fn serve_once(body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let url = format!("http://{}/refs.bib", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).expect("read") == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .expect("write");
            head.to_lowercase()
        });
        (url, handle)
    }

    #[test]
    fn cookies_are_joined_in_key_order() {
        let mut session = Session::new(&Settings::default()).unwrap();
        assert_eq!(session.cookie_header(), None);
        session.set_cookie("sid", "abc");
        session.set_cookie("lang", "en");
        assert_eq!(session.cookie_header().as_deref(), Some("lang=en; sid=abc"));
    }

    #[test]
    fn requests_carry_agent_cookies_and_accept() {
        let settings = Settings {
            user_agent: "papers-test/9".into(),
            ..Settings::default()
        };
        let mut session = Session::new(&settings).unwrap();
        session.set_cookie("sid", "abc");

        let (url, server) = serve_once("ok");
        let body = session
            .get_text_accepting(&url, "application/x-bibtex")
            .expect("request");
        let head = server.join().expect("server");

        assert_eq!(body, "ok");
        assert!(head.starts_with("get /refs.bib http/1.1"), "{head}");
        assert!(head.contains("user-agent: papers-test/9\r\n"), "{head}");
        assert!(head.contains("cookie: sid=abc\r\n"), "{head}");
        assert!(head.contains("accept: application/x-bibtex\r\n"), "{head}");
    }

    #[test]
    fn plain_requests_send_no_cookie_header() {
        let session = Session::new(&Settings::default()).unwrap();
        let (url, server) = serve_once("%PDF-1.4");
        let bytes = session.get_bytes(&url).expect("request");
        let head = server.join().expect("server");

        assert_eq!(bytes, b"%PDF-1.4");
        assert!(head.contains("user-agent: mozilla/5.0"), "{head}");
        assert!(!head.contains("cookie:"), "{head}");
    }

    #[test]
    fn accepts_configured_proxy() {
        let settings = Settings {
            downloader_proxy: Some("http://localhost:3128".into()),
            ..Settings::default()
        };
        assert!(Session::new(&settings).is_ok());
    }
}

//! Local stand-in for the manga site and the relay.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const SEARCH_PAGE: &str = r#"<!doctype html>
<html><body>
<ul class="novel-list">
  <li class="novel-item">
    <a href="/manga/solo-leveling/" title="Solo Leveling">
      <h4 class="novel-title">Solo Leveling</h4>
      <span class="text1row">Chugong</span>
      <div class="summary" title="The weakest hunter of all mankind."></div>
    </a>
  </li>
  <li class="novel-item">
    <a href="https://www.mgeko.com/manga/tower-of-god/"><h4 class="novel-title">Tower of God</h4></a>
  </li>
</ul>
</body></html>
"#;

pub const TITLE_PAGE: &str = r#"<!doctype html>
<html><body>
<ul class="chapter-list">
  <li class="chapter-list-item" data-chapterno="1" data-orderno="1">
    <a href="/reader/en/solo-leveling-chapter-1/"><strong class="chapter-number">1</strong><span class="chapter-stats">1 year ago</span></a>
  </li>
  <li class="chapter-list-item" data-chapterno="2" data-orderno="2">
    <a href="/reader/en/solo-leveling-chapter-2/"><strong class="chapter-number">2-eng-li</strong><span class="chapter-stats">3 days ago</span></a>
  </li>
</ul>
</body></html>
"#;

pub const CHAPTER_PAGE: &str = r#"<!doctype html>
<html><body>
<div id="chapter-reader">
  <img src="https://imgsrv.example/solo-leveling/2/1.jpg">
  <img src="https://imgsrv.example/solo-leveling/2/2.jpg">
</div>
</body></html>
"#;

pub const EMPTY_READER: &str = r#"<div id="chapter-reader"><p>Images are loading</p></div>"#;

pub struct SiteStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown: mpsc::Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SiteStub {
    /// Request paths (with query) in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Relay prefix served by this stub.
    pub fn relay_prefix(&self) -> String {
        format!("{}/raw?url=", self.base_url)
    }
}

impl Drop for SiteStub {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn page_for(path: &str) -> (u16, &'static str) {
    match path {
        "/search/?search=solo%20leveling" => (200, SEARCH_PAGE),
        "/search/?search=nothing" => (200, "<html><body><p>No results</p></body></html>"),
        "/search/?search=broken" => (500, SEARCH_PAGE),
        "/manga/solo-leveling/" => (200, TITLE_PAGE),
        "/reader/en/solo-leveling-chapter-2/" => (200, CHAPTER_PAGE),
        "/reader/en/solo-leveling-chapter-1/" => (200, EMPTY_READER),
        _ => (404, "not found"),
    }
}

pub fn spawn_site() -> SiteStub {
    let server = tiny_http::Server::http("127.0.0.1:0").expect("start tiny_http server");
    let base_url = format!("http://{}", server.server_addr());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let (shutdown, shutdown_rx) = mpsc::channel::<()>();

    let seen = Arc::clone(&requests);
    let base = base_url.clone();
    let handle = thread::spawn(move || loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }
        let request = match server.recv_timeout(Duration::from_millis(50)) {
            Ok(Some(req)) => req,
            Ok(None) => continue,
            Err(_) => break,
        };
        let url = request.url().to_string();
        if let Ok(mut r) = seen.lock() {
            r.push(url.clone());
        }
        let (status, body) = match url.strip_prefix("/raw?url=") {
            Some(encoded) => {
                let target = percent_encoding::percent_decode_str(encoded)
                    .decode_utf8_lossy()
                    .to_string();
                match target.strip_prefix(&base) {
                    Some(path) => page_for(path),
                    None => (502, "relay target outside stub"),
                }
            }
            None => page_for(&url),
        };
        let _ = request.respond(tiny_http::Response::from_string(body).with_status_code(status));
    });

    SiteStub {
        base_url,
        requests,
        shutdown,
        handle: Some(handle),
    }
}

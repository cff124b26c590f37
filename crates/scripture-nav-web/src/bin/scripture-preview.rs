use std::env;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::{Command, ExitCode};
use std::time::Duration;

use scripture_nav::{HttpTransport, MemoryChapterCache, NavConfig, Navigator};
use scripture_nav_web::{
    build_shell_html, catalog_summary, page_payload, query_param, show_location_payload,
    unavailable_payload, CatalogSummary, PagePayload,
};
use serde::Serialize;

const DEFAULT_OUT_PATH: &str = "target/scripture-preview/index.html";
const DEFAULT_PORT: u16 = 42818;
/// Request line plus headers; longer heads are cut off.
const MAX_REQUEST_HEAD_BYTES: u64 = 16 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Args {
    config_path: Option<String>,
    hash: String,
    out_path: String,
    serve: bool,
    open_browser: bool,
    port: u16,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config_path: None,
            hash: String::new(),
            out_path: DEFAULT_OUT_PATH.to_string(),
            serve: false,
            open_browser: false,
            port: DEFAULT_PORT,
        }
    }
}

/// Method and request target (path plus query) of a GET-only API.
#[derive(Debug, PartialEq, Eq)]
struct Request {
    method: String,
    target: String,
}

#[derive(Debug, PartialEq, Eq)]
struct Response {
    status: &'static str,
    content_type: &'static str,
    body: Vec<u8>,
}

impl Response {
    fn json<T: Serialize>(value: &T) -> Result<Self, String> {
        Ok(Self {
            status: "200 OK",
            content_type: "application/json",
            body: serde_json::to_vec(value).map_err(|e| e.to_string())?,
        })
    }

    fn error(status: &'static str, code: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: format!(r#"{{"error":"{}"}}"#, code).into_bytes(),
        }
    }

    fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        write!(
            out,
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nCache-Control: no-store\r\nConnection: close\r\n\r\n",
            self.status,
            self.content_type,
            self.body.len()
        )?;
        out.write_all(&self.body)?;
        out.flush()
    }
}

type Session = Navigator<HttpTransport, MemoryChapterCache>;

/// Navigator plus the config it was built from, so the failure page can be
/// served when the catalog never loaded.
struct Server {
    config: NavConfig,
    session: Option<Session>,
    shell: String,
}

impl Server {
    fn start(config: NavConfig) -> Self {
        let config = config.normalized();
        let transport = HttpTransport::new(&config);
        let session = match Navigator::init(transport, config.clone()) {
            Ok(session) => Some(session),
            Err(err) => {
                eprintln!("catalog load failed: {}", err);
                None
            }
        };
        Self {
            config,
            session,
            shell: String::new(),
        }
    }

    fn page(&mut self, hash: &str) -> PagePayload {
        match self.session.as_mut() {
            Some(session) => page_payload(session, hash),
            None => unavailable_payload(&self.config),
        }
    }

    fn catalog(&self) -> CatalogSummary {
        match &self.session {
            Some(session) => catalog_summary(session.catalog()),
            None => CatalogSummary {
                available: false,
                volumes: Vec::new(),
            },
        }
    }

    fn respond(&mut self, req: &Request) -> Result<Response, String> {
        if req.method != "GET" {
            return Ok(Response::error("405 Method Not Allowed", "method_not_allowed"));
        }
        let path = req.target.split('?').next().unwrap_or_default();
        match path {
            "/" => Ok(Response {
                status: "200 OK",
                content_type: "text/html; charset=utf-8",
                body: self.shell.clone().into_bytes(),
            }),
            "/api/page" => {
                let hash = query_param(&req.target, "hash").unwrap_or_default();
                Response::json(&self.page(&hash))
            }
            "/api/catalog" => Response::json(&self.catalog()),
            "/api/show-location" => {
                let Some(call) = query_param(&req.target, "call") else {
                    return Ok(Response::error("400 Bad Request", "missing_call"));
                };
                match self.session.as_mut() {
                    Some(session) => Response::json(&show_location_payload(session, &call)),
                    None => Ok(Response::error(
                        "503 Service Unavailable",
                        "catalog_unavailable",
                    )),
                }
            }
            "/favicon.ico" => Ok(Response {
                status: "204 No Content",
                content_type: "text/plain",
                body: Vec::new(),
            }),
            _ => Ok(Response::error("404 Not Found", "not_found")),
        }
    }
}

fn main() -> ExitCode {
    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let cli = parse_args(args)?;
    let config = match &cli.config_path {
        Some(path) => NavConfig::load(path).map_err(|e| e.to_string())?,
        None => NavConfig::default(),
    };
    let mut server = Server::start(config);

    if cli.serve {
        return run_server(&mut server, &cli.hash, cli.port, cli.open_browser);
    }

    if cli.out_path.is_empty() {
        return Err("--out must not be empty".to_string());
    }
    if let Some(parent) = Path::new(&cli.out_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
    }

    let payload = server.page(&cli.hash);
    let data_json = serde_json::to_string(&payload).map_err(|e| e.to_string())?;
    let html = build_shell_html(&data_json, false, &server.config.top_level_title);
    std::fs::write(&cli.out_path, html).map_err(|e| e.to_string())?;

    println!(
        "wrote scripture preview to {} (hash={:?}, markers={})",
        cli.out_path,
        payload.hash,
        payload.markers.len(),
    );
    Ok(())
}

fn run_server(server: &mut Server, hash: &str, port: u16, open_browser: bool) -> Result<(), String> {
    let listener = TcpListener::bind(("127.0.0.1", port)).map_err(|e| e.to_string())?;
    let addr = listener.local_addr().map_err(|e| e.to_string())?;

    let initial_payload = server.page(hash);
    let initial_json = serde_json::to_string(&initial_payload).map_err(|e| e.to_string())?;
    server.shell = build_shell_html(&initial_json, true, &server.config.top_level_title);
    let url = format!("http://{}/#{}", addr, initial_payload.hash);

    println!("serving scripture preview at {}", url);
    if open_browser {
        open_in_browser(&url);
    }

    for incoming in listener.incoming() {
        let result = incoming
            .map_err(|e| format!("accept error: {}", e))
            .and_then(|stream| serve_connection(stream, server));
        if let Err(err) = result {
            eprintln!("{}", err);
        }
    }

    Ok(())
}

fn open_in_browser(url: &str) {
    let opened = ["open", "xdg-open"].iter().any(|launcher| {
        Command::new(launcher)
            .arg(url)
            .status()
            .is_ok_and(|status| status.success())
    });
    if !opened {
        eprintln!("no browser launcher found; open {} manually", url);
    }
}

fn serve_connection(mut stream: TcpStream, server: &mut Server) -> Result<(), String> {
    stream
        .set_read_timeout(Some(Duration::from_secs(15)))
        .map_err(|e| e.to_string())?;
    let req = read_request(BufReader::new(&stream))?;
    let response = server.respond(&req)?;
    response
        .write_to(&mut stream)
        .map_err(|e| format!("{} {}: {}", req.method, req.target, e))
}

/// Read the request line and skip the headers; no route takes a body.
fn read_request<R: BufRead>(reader: R) -> Result<Request, String> {
    let mut head = reader.take(MAX_REQUEST_HEAD_BYTES);
    let mut line = String::new();
    head.read_line(&mut line).map_err(|e| e.to_string())?;

    let mut parts = line.split_whitespace();
    let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("malformed request line {:?}", line.trim_end()));
    };
    if !version.starts_with("HTTP/") {
        return Err(format!("unsupported protocol {:?}", version));
    }
    let req = Request {
        method: method.to_string(),
        target: target.to_string(),
    };

    let mut header = String::new();
    loop {
        header.clear();
        let n = head.read_line(&mut header).map_err(|e| e.to_string())?;
        if n == 0 || header.trim_end().is_empty() {
            break;
        }
    }
    Ok(req)
}

fn parse_args(args: Vec<String>) -> Result<Args, String> {
    let mut cfg = Args::default();
    let mut args = args.into_iter().skip(1);

    while let Some(flag) = args.next() {
        let mut value = || {
            args.next()
                .ok_or_else(|| format!("{} requires a value", flag))
        };
        match flag.as_str() {
            "-h" | "--help" => return Err("help requested".to_string()),
            "--config" => cfg.config_path = Some(value()?),
            "--hash" => cfg.hash = value()?,
            "--out" => cfg.out_path = value()?,
            "--port" => {
                let raw = value()?;
                cfg.port = raw
                    .parse::<u16>()
                    .map_err(|_| format!("invalid --port value '{}'", raw))?;
            }
            "--serve" => cfg.serve = true,
            "--open" => cfg.open_browser = true,
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }

    Ok(cfg)
}

fn help_text() -> &'static str {
    r#"scripture-preview - local web shell for the scriptures navigator

USAGE:
  cargo run -p scripture-nav-web --bin scripture-preview -- [options]

MODES:
  default: render one page and write a standalone HTML file at --out
  --serve: start a local server that routes every hash change

OPTIONS:
  --config <file>             JSON navigator config
  --hash <hash>               initial hash, e.g. 1:101:2 (default: home)
  --out <file>                output HTML path (default: target/scripture-preview/index.html)
  --serve                     start local server mode
  --open                      open browser automatically (use with --serve)
  --port <n>                  server port in --serve mode (default: 42818)
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("scripture-preview")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    fn offline_server() -> Server {
        Server {
            config: NavConfig::default(),
            session: None,
            shell: "<html></html>".to_string(),
        }
    }

    fn get(target: &str) -> Request {
        Request {
            method: "GET".to_string(),
            target: target.to_string(),
        }
    }

    #[test]
    fn read_request_keeps_target_and_skips_headers() {
        let raw = b"GET /api/page?hash=1%3A101 HTTP/1.1\r\nHost: x\r\nAccept: */*\r\n\r\n";
        let req = read_request(&raw[..]).expect("request parses");
        assert_eq!(req, get("/api/page?hash=1%3A101"));
    }

    #[test]
    fn read_request_rejects_garbage() {
        assert!(read_request(&b""[..]).is_err());
        assert!(read_request(&b"GET /\r\n\r\n"[..]).is_err());
        assert!(read_request(&b"GET / SPDY/3\r\n\r\n"[..]).is_err());
    }

    #[test]
    fn offline_server_serves_fallbacks() {
        let mut server = offline_server();

        let shell = server.respond(&get("/")).expect("shell served");
        assert_eq!(shell.body, b"<html></html>");

        let page = server.respond(&get("/api/page?hash=1%3A101")).expect("page served");
        assert_eq!(page.status, "200 OK");
        let body = String::from_utf8(page.body).expect("utf8 body");
        assert!(body.contains("Unable to load the scriptures catalog."));

        let catalog = server.respond(&get("/api/catalog")).expect("catalog served");
        assert_eq!(catalog.body, br#"{"available":false,"volumes":[]}"#);

        let location = server
            .respond(&get("/api/show-location?call=showLocation(1)"))
            .expect("location answered");
        assert_eq!(location.status, "503 Service Unavailable");
    }

    #[test]
    fn unknown_routes_and_methods_are_rejected() {
        let mut server = offline_server();
        assert_eq!(
            server.respond(&get("/api/show-location")).map(|r| r.status),
            Ok("400 Bad Request")
        );
        assert_eq!(
            server.respond(&get("/favicon.ico")).map(|r| r.status),
            Ok("204 No Content")
        );
        assert_eq!(
            server.respond(&get("/api/pages")).map(|r| r.status),
            Ok("404 Not Found")
        );
        let post = Request {
            method: "POST".to_string(),
            target: "/api/page".to_string(),
        };
        assert_eq!(
            server.respond(&post).map(|r| r.status),
            Ok("405 Method Not Allowed")
        );
    }

    #[test]
    fn response_writes_length_and_body() {
        let mut out = Vec::new();
        Response::error("404 Not Found", "not_found")
            .write_to(&mut out)
            .expect("write to vec");
        let text = String::from_utf8(out).expect("utf8 response");
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Content-Length: 21\r\n"));
        assert!(text.ends_with("\r\n\r\n{\"error\":\"not_found\"}"));
    }

    #[test]
    fn parse_args_reads_export_options() {
        let cfg = parse_args(args(&["--hash", "1:101:2", "--out", "out/page.html"])).expect("parses");
        assert_eq!(cfg.hash, "1:101:2");
        assert_eq!(cfg.out_path, "out/page.html");
        assert!(!cfg.serve);
        assert_eq!(cfg.port, DEFAULT_PORT);
    }

    #[test]
    fn parse_args_rejects_bad_input() {
        assert!(parse_args(args(&["--serve", "--port", "http"])).is_err());
        assert!(parse_args(args(&["--hash"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
        assert!(parse_args(args(&["--help"])).is_err());
    }
}
